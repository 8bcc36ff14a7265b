// src/domain/page.rs
use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

/// Zero-based page index plus page size. Deserializing validates the size
/// the same way [`PageRequest::of`] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPageRequest")]
pub struct PageRequest {
    page: u32,
    size: u32,
}

#[derive(Deserialize)]
struct RawPageRequest {
    page: u32,
    size: u32,
}

impl TryFrom<RawPageRequest> for PageRequest {
    type Error = DomainError;

    fn try_from(raw: RawPageRequest) -> Result<Self, Self::Error> {
        Self::of(raw.page, raw.size)
    }
}

impl PageRequest {
    pub fn of(page: u32, size: u32) -> DomainResult<Self> {
        if size == 0 {
            return Err(DomainError::Validation(
                "page size must be at least one".into(),
            ));
        }
        Ok(Self { page, size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Number of results skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            size: self.size,
        }
    }

    pub fn previous_or_first(&self) -> Self {
        Self {
            page: self.page.saturating_sub(1),
            size: self.size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: 0, size: 10 }
    }
}

/// A bounded slice of results together with the total number of matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize",
    deserialize = "T: serde::de::DeserializeOwned"
))]
pub struct Page<T> {
    content: Vec<T>,
    request: PageRequest,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            request,
            total_elements,
        }
    }

    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    pub fn number(&self) -> u32 {
        self.request.page()
    }

    pub fn size(&self) -> u32 {
        self.request.size()
    }

    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    pub fn total_pages(&self) -> u64 {
        self.total_elements.div_ceil(u64::from(self.request.size()))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number()) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number() > 0
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn request(&self) -> PageRequest {
        self.request
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            request: self.request,
            total_elements: self.total_elements,
        }
    }
}
