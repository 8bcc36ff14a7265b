// src/domain/search.rs
use crate::domain::article::query::SearchQuery;
use crate::domain::page::{Page, PageRequest};

/// A full search against the article index: scoring query, optional
/// non-scoring post filter and optional paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: SearchQuery,
    post_filter: Option<SearchQuery>,
    page: Option<PageRequest>,
}

impl SearchRequest {
    pub fn new(query: SearchQuery) -> Self {
        Self {
            query,
            post_filter: None,
            page: None,
        }
    }

    /// Match everything, narrowed only by a post filter.
    pub fn filtered(filter: SearchQuery) -> Self {
        Self::new(SearchQuery::MatchAll).with_filter(filter)
    }

    pub fn with_filter(mut self, filter: SearchQuery) -> Self {
        self.post_filter = Some(filter);
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn post_filter(&self) -> Option<&SearchQuery> {
        self.post_filter.as_ref()
    }

    pub fn page(&self) -> Option<PageRequest> {
        self.page
    }

    /// Paging applied by adapters; unpaged requests fetch the first ten hits.
    pub fn effective_page(&self) -> PageRequest {
        self.page.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<T> {
    pub id: String,
    pub score: Option<f64>,
    pub content: T,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits<T> {
    total_hits: u64,
    max_score: Option<f64>,
    hits: Vec<SearchHit<T>>,
}

impl<T> SearchHits<T> {
    pub fn new(total_hits: u64, max_score: Option<f64>, hits: Vec<SearchHit<T>>) -> Self {
        Self {
            total_hits,
            max_score,
            hits,
        }
    }

    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    pub fn max_score(&self) -> Option<f64> {
        self.max_score
    }

    pub fn hits(&self) -> &[SearchHit<T>] {
        &self.hits
    }

    pub fn search_hit(&self, index: usize) -> Option<&SearchHit<T>> {
        self.hits.get(index)
    }

    pub fn has_hits(&self) -> bool {
        !self.hits.is_empty()
    }

    pub fn into_page(self, request: PageRequest) -> Page<T> {
        let content = self.hits.into_iter().map(|hit| hit.content).collect();
        Page::new(content, request, self.total_hits)
    }
}
