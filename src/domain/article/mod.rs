pub mod entity;
pub mod mapping;
pub mod query;
pub mod repository;
pub mod value_objects;

pub use entity::Article;
pub use mapping::{FieldType, article_index_mappings};
pub use query::{DerivedQuery, QueryTemplate, SearchQuery};
pub use repository::ArticleRepository;
pub use value_objects::{ArticleId, Author};
