// tests/support/scenarios.rs
// Repository behaviour shared by the in-memory and live-engine suites. Each
// scenario expects a repository holding exactly the `seed` documents.
use super::fixtures::{Seeded, john_doe, john_smith};
use blog_search::domain::article::{
    Article, ArticleId, ArticleRepository, DerivedQuery, SearchQuery,
};
use blog_search::domain::errors::DomainError;
use blog_search::domain::page::PageRequest;
use blog_search::domain::search::SearchRequest;

fn first_page() -> PageRequest {
    PageRequest::of(0, 10).unwrap()
}

fn practice_fuzzy() -> SearchRequest {
    SearchRequest::new(SearchQuery::fuzzy("title", "practice"))
}

pub async fn saved_article_gets_id(repo: &dyn ArticleRepository, _seeded: &Seeded) {
    let article = Article::new("Testing is great!").with_authors([john_smith()]);
    assert!(article.id().is_none());

    let saved = repo.save(article).await.unwrap();

    assert!(saved.id().is_some(), "ID should be assigned");
    assert_eq!(saved.title(), "Testing is great!");
}

pub async fn author_queries_agree(repo: &dyn ArticleRepository, seeded: &Seeded) {
    let derived = repo
        .find_by_authors_name(john_doe().name(), first_page())
        .await
        .unwrap();
    let custom = repo
        .find_by_authors_name_using_custom_query(john_doe().name(), first_page())
        .await
        .unwrap();

    assert_eq!(derived.total_elements(), 2, "Amount of records should be 2");
    assert_eq!(custom.total_elements(), derived.total_elements());

    let mut derived_ids: Vec<_> = derived.content().iter().filter_map(Article::id).collect();
    let mut custom_ids: Vec<_> = custom.content().iter().filter_map(Article::id).collect();
    derived_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    custom_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(derived_ids, custom_ids);

    let mut expected: Vec<_> = [&seeded.spring, &seeded.practice]
        .into_iter()
        .filter_map(Article::id)
        .collect();
    expected.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    assert_eq!(derived_ids, expected);
}

pub async fn unknown_author_finds_nothing(repo: &dyn ArticleRepository, _seeded: &Seeded) {
    let page = repo
        .find_by_authors_name("Jane Roe", first_page())
        .await
        .unwrap();
    assert_eq!(page.total_elements(), 0);
    assert!(page.is_empty());
}

pub async fn regex_title_filter_finds_one(repo: &dyn ArticleRepository, seeded: &Seeded) {
    let request = SearchRequest::filtered(SearchQuery::regexp("title", ".*practice.*"));

    let hits = repo.search(&request).await.unwrap();

    assert_eq!(hits.total_hits(), 1, "Amount of records should be 1");
    assert_eq!(hits.search_hit(0).unwrap().content.id(), seeded.practice.id());
}

pub async fn transposed_title_term_is_fuzzy_match(repo: &dyn ArticleRepository, seeded: &Seeded) {
    let request = SearchRequest::new(SearchQuery::fuzzy("title", "nxet"));

    let hits = repo.search(&request).await.unwrap();

    assert_eq!(hits.total_hits(), 1);
    assert_eq!(hits.search_hit(0).unwrap().content.id(), seeded.practice.id());
}

// The id is assigned by the first save, so only a later save writes it into
// the stored body where `id` queries can see it.
pub async fn id_field_is_searchable_after_resave(repo: &dyn ArticleRepository, seeded: &Seeded) {
    let by_id = DerivedQuery::parse("findById").unwrap();
    assert_eq!(by_id.method(), "findById");
    let id = seeded.spring.id().unwrap();
    let request = SearchRequest::new(by_id.bind(&[id.as_str()]).unwrap());

    assert_eq!(repo.search(&request).await.unwrap().total_hits(), 0);

    repo.save(seeded.spring.clone()).await.unwrap();

    let hits = repo.search(&request).await.unwrap();
    assert_eq!(hits.total_hits(), 1);
    assert_eq!(hits.search_hit(0).unwrap().content.id(), Some(id));
    assert_eq!(repo.count().await.unwrap(), 2);
}

pub async fn title_update_is_read_back(repo: &dyn ArticleRepository, seeded: &Seeded) {
    let hits = repo.search(&practice_fuzzy()).await.unwrap();
    assert_eq!(hits.total_hits(), 1, "Amount of records should be 1");

    let mut article = hits.search_hit(0).unwrap().content.clone();
    let new_title = "Exciting new project!";
    article.set_title(new_title);
    let saved = repo.save(article).await.unwrap();
    assert_eq!(saved.id(), seeded.practice.id());

    let id = saved.id().unwrap();
    let reloaded = repo.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(reloaded.title(), new_title, "Titles should match");
    assert_eq!(reloaded.authors(), seeded.practice.authors());
    assert_eq!(repo.count().await.unwrap(), 2);
}

pub async fn delete_removes_document(repo: &dyn ArticleRepository, _seeded: &Seeded) {
    let hits = repo.search(&practice_fuzzy()).await.unwrap();
    assert_eq!(hits.total_hits(), 1, "Amount of records should be 1");
    let count = repo.count().await.unwrap();

    let article = hits.search_hit(0).unwrap().content.clone();
    repo.delete(&article).await.unwrap();

    assert_eq!(repo.count().await.unwrap(), count - 1);
    assert_eq!(repo.search(&practice_fuzzy()).await.unwrap().total_hits(), 0);
    assert!(!repo.exists_by_id(article.id().unwrap()).await.unwrap());
}

pub async fn delete_all_empties_index(repo: &dyn ArticleRepository, _seeded: &Seeded) {
    repo.delete_all().await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 0);
}

pub async fn missing_documents(repo: &dyn ArticleRepository, seeded: &Seeded) {
    let unknown = ArticleId::new("does-not-exist").unwrap();
    assert!(repo.find_by_id(&unknown).await.unwrap().is_none());
    assert!(!repo.exists_by_id(&unknown).await.unwrap());

    repo.delete_by_id(&unknown).await.unwrap();
    assert_eq!(repo.count().await.unwrap(), 2);

    let spring = repo
        .find_by_id(seeded.spring.id().unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(spring, seeded.spring);
}

pub async fn unsaved_article_cannot_be_deleted(repo: &dyn ArticleRepository, _seeded: &Seeded) {
    let result = repo.delete(&Article::new("never saved")).await;
    assert!(matches!(result, Err(DomainError::Validation(_))));
    assert_eq!(repo.count().await.unwrap(), 2);
}

pub async fn pages_slice_results(repo: &dyn ArticleRepository, _seeded: &Seeded) {
    repo.save_all(vec![
        Article::new("Doe on testing").with_authors([john_doe()]),
        Article::new("Doe on paging").with_authors([john_doe()]),
    ])
    .await
    .unwrap();

    let first = repo
        .find_by_authors_name(john_doe().name(), PageRequest::of(0, 3).unwrap())
        .await
        .unwrap();
    assert_eq!(first.total_elements(), 4);
    assert_eq!(first.number_of_elements(), 3);
    assert_eq!(first.total_pages(), 2);
    assert!(first.has_next());

    let second = repo
        .find_by_authors_name_using_custom_query(
            john_doe().name(),
            PageRequest::of(1, 3).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(second.total_elements(), 4);
    assert_eq!(second.number_of_elements(), 1);
    assert!(second.is_last());

    let all = repo.find_all(PageRequest::of(0, 10).unwrap()).await.unwrap();
    assert_eq!(all.total_elements(), 4);
}
