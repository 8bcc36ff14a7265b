pub mod article;
pub mod errors;
pub mod page;
pub mod search;
