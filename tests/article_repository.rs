// Repository behaviour against the in-memory adapter.
mod support;

use blog_search::domain::article::ArticleRepository;
use blog_search::infrastructure::repositories::InMemoryArticleRepository;
use support::{Seeded, scenarios, seed};

async fn seeded() -> (InMemoryArticleRepository, Seeded) {
    let repo = InMemoryArticleRepository::new();
    let seeded = seed(&repo).await;
    (repo, seeded)
}

#[tokio::test]
async fn given_article_when_saved_then_id_is_assigned() {
    let (repo, seeded) = seeded().await;
    scenarios::saved_article_gets_id(&repo, &seeded).await;
}

#[tokio::test]
async fn given_persisted_articles_when_search_by_authors_name_then_both_queries_agree() {
    let (repo, seeded) = seeded().await;
    scenarios::author_queries_agree(&repo, &seeded).await;
}

#[tokio::test]
async fn given_unknown_author_when_searched_then_page_is_empty() {
    let (repo, seeded) = seeded().await;
    scenarios::unknown_author_finds_nothing(&repo, &seeded).await;
}

#[tokio::test]
async fn given_persisted_articles_when_filtered_by_title_regex_then_one_found() {
    let (repo, seeded) = seeded().await;
    scenarios::regex_title_filter_finds_one(&repo, &seeded).await;
}

#[tokio::test]
async fn given_transposed_letters_when_fuzzy_searched_then_title_found() {
    let (repo, seeded) = seeded().await;
    scenarios::transposed_title_term_is_fuzzy_match(&repo, &seeded).await;
}

#[tokio::test]
async fn given_saved_once_when_searched_by_id_field_then_found_only_after_resave() {
    let (repo, seeded) = seeded().await;
    scenarios::id_field_is_searchable_after_resave(&repo, &seeded).await;
}

#[tokio::test]
async fn given_saved_document_when_title_updated_then_new_title_is_read_back() {
    let (repo, seeded) = seeded().await;
    scenarios::title_update_is_read_back(&repo, &seeded).await;
}

#[tokio::test]
async fn given_saved_document_when_deleted_then_removed_from_index() {
    let (repo, seeded) = seeded().await;
    scenarios::delete_removes_document(&repo, &seeded).await;
}

#[tokio::test]
async fn given_documents_when_delete_all_then_count_is_zero() {
    let (repo, seeded) = seeded().await;
    scenarios::delete_all_empties_index(&repo, &seeded).await;
}

#[tokio::test]
async fn given_unknown_id_then_lookups_are_empty_and_delete_is_ignored() {
    let (repo, seeded) = seeded().await;
    scenarios::missing_documents(&repo, &seeded).await;
}

#[tokio::test]
async fn given_unsaved_article_when_deleted_then_validation_error() {
    let (repo, seeded) = seeded().await;
    scenarios::unsaved_article_cannot_be_deleted(&repo, &seeded).await;
}

#[tokio::test]
async fn given_more_matches_than_page_size_then_results_are_paged() {
    let (repo, seeded) = seeded().await;
    scenarios::pages_slice_results(&repo, &seeded).await;
}

#[tokio::test]
async fn repository_is_usable_as_trait_object() {
    let repo: std::sync::Arc<dyn ArticleRepository> =
        std::sync::Arc::new(InMemoryArticleRepository::new());
    seed(repo.as_ref()).await;
    assert_eq!(repo.count().await.unwrap(), 2);
}
