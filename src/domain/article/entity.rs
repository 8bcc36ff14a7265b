// src/domain/article/entity.rs
use crate::domain::article::value_objects::{ArticleId, Author};
use serde::{Deserialize, Serialize};

/// A blog article as stored in the search index.
///
/// `id` stays `None` until a repository has saved the article; after that the
/// engine-assigned identifier is carried along and never changes. Authors are
/// embedded inline and share the article's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<ArticleId>,
    title: String,
    #[serde(default)]
    authors: Vec<Author>,
}

impl Article {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            authors: Vec::new(),
        }
    }

    pub fn with_authors(mut self, authors: impl IntoIterator<Item = Author>) -> Self {
        self.authors = authors.into_iter().collect();
        self
    }

    pub fn id(&self) -> Option<&ArticleId> {
        self.id.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn set_authors(&mut self, authors: impl IntoIterator<Item = Author>) {
        self.authors = authors.into_iter().collect();
    }

    pub fn add_author(&mut self, author: Author) {
        self.authors.push(author);
    }

    /// Attach the identifier the engine stored this document under.
    pub(crate) fn assign_id(mut self, id: ArticleId) -> Self {
        self.id = Some(id);
        self
    }
}
