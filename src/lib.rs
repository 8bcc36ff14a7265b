//! Blog articles with embedded authors, stored in and queried from an
//! Elasticsearch-compatible engine through [`ArticleRepository`].
//!
//! [`ArticleRepository`]: domain::article::ArticleRepository

pub mod config;
pub mod domain;
pub mod infrastructure;
