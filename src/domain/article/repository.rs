use crate::domain::article::entity::Article;
use crate::domain::article::query::{
    AUTHORS_NAME_QUERY, DerivedQuery, FIND_BY_AUTHORS_NAME, QueryTemplate, SearchQuery,
};
use crate::domain::article::value_objects::ArticleId;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::page::{Page, PageRequest};
use crate::domain::search::{SearchHits, SearchRequest};
use async_trait::async_trait;

/// Persistence and lookup for articles.
///
/// Adapters implement the primitive operations, each as a single round trip
/// to the engine. The query methods are provided on top of [`search`] so
/// every adapter executes them the same way.
///
/// [`search`]: ArticleRepository::search
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert a new article or fully replace an existing one. The returned
    /// article always carries its identifier.
    async fn save(&self, article: Article) -> DomainResult<Article>;
    async fn find_by_id(&self, id: &ArticleId) -> DomainResult<Option<Article>>;
    async fn exists_by_id(&self, id: &ArticleId) -> DomainResult<bool>;
    async fn count(&self) -> DomainResult<u64>;
    /// Removing an id that is not stored is not an error.
    async fn delete_by_id(&self, id: &ArticleId) -> DomainResult<()>;
    async fn delete_all(&self) -> DomainResult<()>;
    async fn search(&self, request: &SearchRequest) -> DomainResult<SearchHits<Article>>;

    async fn delete(&self, article: &Article) -> DomainResult<()> {
        let id = article
            .id()
            .ok_or_else(|| DomainError::validation("cannot delete an article that was never saved"))?;
        self.delete_by_id(id).await
    }

    async fn save_all(&self, articles: Vec<Article>) -> DomainResult<Vec<Article>> {
        let mut saved = Vec::with_capacity(articles.len());
        for article in articles {
            saved.push(self.save(article).await?);
        }
        Ok(saved)
    }

    async fn find_all(&self, page: PageRequest) -> DomainResult<Page<Article>> {
        self.search_page(SearchQuery::MatchAll, page).await
    }

    /// Articles with at least one author whose name matches `name`, derived
    /// from the `findByAuthorsName` method convention.
    async fn find_by_authors_name(&self, name: &str, page: PageRequest) -> DomainResult<Page<Article>> {
        let query = DerivedQuery::parse(FIND_BY_AUTHORS_NAME)?.bind(&[name])?;
        self.search_page(query, page).await
    }

    /// Same result set as [`find_by_authors_name`], expressed as an explicit
    /// query template.
    ///
    /// [`find_by_authors_name`]: ArticleRepository::find_by_authors_name
    async fn find_by_authors_name_using_custom_query(
        &self,
        name: &str,
        page: PageRequest,
    ) -> DomainResult<Page<Article>> {
        let query = QueryTemplate::new(AUTHORS_NAME_QUERY).render(&[name])?;
        self.search_page(query, page).await
    }

    async fn search_page(&self, query: SearchQuery, page: PageRequest) -> DomainResult<Page<Article>> {
        let request = SearchRequest::new(query).with_page(page);
        Ok(self.search(&request).await?.into_page(page))
    }
}
