pub mod analysis;
pub mod elasticsearch;
pub mod repositories;
