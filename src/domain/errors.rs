// src/domain/errors.rs
use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("search engine unreachable: {0}")]
    Connectivity(String),
    #[error("search engine fault ({status} {kind}): {reason}")]
    Engine {
        status: u16,
        kind: String,
        reason: String,
    },
    #[error("malformed query: {0}")]
    MalformedQuery(String),
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed_query(msg: impl Into<String>) -> Self {
        Self::MalformedQuery(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}
