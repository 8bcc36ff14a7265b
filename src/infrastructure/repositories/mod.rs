// src/infrastructure/repositories/mod.rs
mod elasticsearch_article;
mod error;
mod memory_article;

pub use elasticsearch_article::ElasticsearchArticleRepository;
pub use error::{map_engine_error, map_reqwest};
pub use memory_article::InMemoryArticleRepository;
