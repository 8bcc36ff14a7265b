//! Process-local [`ArticleRepository`] for tests and embedded use.
//!
//! Documents live in a `Vec` behind an `RwLock`, kept in insertion order.
//! Queries are evaluated against the same field mapping the engine index is
//! created with: `text` fields are analysed into lowercase tokens, `keyword`
//! fields are compared whole. Hits carry no relevance score.

use crate::domain::article::mapping::{FieldType, ResolvedField, resolve_path};
use crate::domain::article::{Article, ArticleId, ArticleRepository, SearchQuery};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::search::{SearchHit, SearchHits, SearchRequest};
use crate::infrastructure::analysis::{analyze, is_fuzzy_match};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

struct StoredArticle {
    id: ArticleId,
    article: Article,
    source: Value,
}

#[derive(Default)]
pub struct InMemoryArticleRepository {
    documents: RwLock<Vec<StoredArticle>>,
}

impl InMemoryArticleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, Vec<StoredArticle>>> {
        self.documents
            .read()
            .map_err(|_| DomainError::persistence("article store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, Vec<StoredArticle>>> {
        self.documents
            .write()
            .map_err(|_| DomainError::persistence("article store lock poisoned"))
    }
}

/// A query compiled once per search and evaluated per document.
enum Matcher {
    All,
    Nothing,
    Field { field: ResolvedField, test: FieldTest },
    Bool {
        must: Vec<Matcher>,
        should: Vec<Matcher>,
        must_not: Vec<Matcher>,
    },
}

enum FieldTest {
    AnyOf(Vec<String>),
    Pattern(Regex),
    Fuzzy(String),
}

impl Matcher {
    fn compile(query: &SearchQuery) -> DomainResult<Self> {
        let (field, test) = match query {
            SearchQuery::MatchAll => return Ok(Self::All),
            SearchQuery::Bool(query) => {
                let compile_all = |clauses: &[SearchQuery]| {
                    clauses.iter().map(Self::compile).collect::<DomainResult<Vec<_>>>()
                };
                // `filter` only differs from `must` in scoring, which this store does not do.
                let mut must = compile_all(&query.must)?;
                must.extend(compile_all(&query.filter)?);
                return Ok(Self::Bool {
                    must,
                    should: compile_all(&query.should)?,
                    must_not: compile_all(&query.must_not)?,
                });
            }
            SearchQuery::Match { field, query } => {
                let field_type = resolve_path(field).map(|f| f.field_type);
                let terms = match field_type {
                    Some(FieldType::Text) => analyze(query),
                    _ => vec![query.clone()],
                };
                if terms.is_empty() {
                    return Ok(Self::Nothing);
                }
                (field, FieldTest::AnyOf(terms))
            }
            SearchQuery::Term { field, value } => (field, FieldTest::AnyOf(vec![value.clone()])),
            SearchQuery::Regexp { field, pattern } => {
                let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
                    DomainError::malformed_query(format!("invalid regexp `{pattern}`: {err}"))
                })?;
                (field, FieldTest::Pattern(anchored))
            }
            SearchQuery::Fuzzy { field, value } => (field, FieldTest::Fuzzy(value.clone())),
        };

        // Unmapped fields match nothing, as on the engine.
        Ok(match resolve_path(field) {
            Some(field) if field.field_type != FieldType::Nested => Self::Field { field, test },
            _ => Self::Nothing,
        })
    }

    fn matches(&self, source: &Value) -> bool {
        match self {
            Self::All => true,
            Self::Nothing => false,
            Self::Field { field, test } => {
                let candidates = field_terms(field, source);
                candidates.iter().any(|candidate| match test {
                    FieldTest::AnyOf(terms) => terms.iter().any(|term| term == candidate),
                    FieldTest::Pattern(regex) => regex.is_match(candidate),
                    FieldTest::Fuzzy(term) => is_fuzzy_match(term, candidate),
                })
            }
            Self::Bool {
                must,
                should,
                must_not,
            } => {
                must.iter().all(|m| m.matches(source))
                    && !must_not.iter().any(|m| m.matches(source))
                    && (should.is_empty()
                        || !must.is_empty()
                        || should.iter().any(|m| m.matches(source)))
            }
        }
    }
}

/// Indexed terms of `field` in `source`: analysed tokens for `text`, whole
/// values for `keyword`. Arrays along the path are flattened.
fn field_terms(field: &ResolvedField, source: &Value) -> Vec<String> {
    let mut values = Vec::new();
    collect_values(source, &field.source_path, &mut values);
    match field.field_type {
        FieldType::Text => values.iter().flat_map(|value| analyze(value)).collect(),
        _ => values,
    }
}

fn collect_values(node: &Value, path: &[&str], out: &mut Vec<String>) {
    match node {
        Value::Array(items) => {
            for item in items {
                collect_values(item, path, out);
            }
        }
        _ => match path.split_first() {
            Some((head, rest)) => {
                if let Some(child) = node.get(*head) {
                    collect_values(child, rest, out);
                }
            }
            None => match node {
                Value::String(text) => out.push(text.clone()),
                Value::Number(number) => out.push(number.to_string()),
                Value::Bool(flag) => out.push(flag.to_string()),
                _ => {}
            },
        },
    }
}

fn to_source(article: &Article) -> DomainResult<Value> {
    serde_json::to_value(article)
        .map_err(|err| DomainError::persistence(format!("cannot encode article: {err}")))
}

#[async_trait]
impl ArticleRepository for InMemoryArticleRepository {
    async fn save(&self, article: Article) -> DomainResult<Article> {
        let id = match article.id() {
            Some(id) => id.clone(),
            None => ArticleId::new(Uuid::new_v4().simple().to_string())?,
        };
        // The engine indexes the body as sent, so a first save stores no `id`.
        let source = to_source(&article)?;
        let article = article.assign_id(id.clone());
        let stored = StoredArticle {
            id: id.clone(),
            source,
            article: article.clone(),
        };

        let mut documents = self.write()?;
        match documents.iter_mut().find(|doc| doc.id == id) {
            Some(existing) => *existing = stored,
            None => documents.push(stored),
        }
        tracing::debug!(id = id.as_str(), "stored article in memory");
        Ok(article)
    }

    async fn find_by_id(&self, id: &ArticleId) -> DomainResult<Option<Article>> {
        let documents = self.read()?;
        Ok(documents
            .iter()
            .find(|doc| &doc.id == id)
            .map(|doc| doc.article.clone()))
    }

    async fn exists_by_id(&self, id: &ArticleId) -> DomainResult<bool> {
        Ok(self.read()?.iter().any(|doc| &doc.id == id))
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.read()?.len() as u64)
    }

    async fn delete_by_id(&self, id: &ArticleId) -> DomainResult<()> {
        let mut documents = self.write()?;
        let before = documents.len();
        documents.retain(|doc| &doc.id != id);
        if documents.len() == before {
            tracing::warn!(id = id.as_str(), "delete of unknown article ignored");
        }
        Ok(())
    }

    async fn delete_all(&self) -> DomainResult<()> {
        self.write()?.clear();
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> DomainResult<SearchHits<Article>> {
        let query = Matcher::compile(request.query())?;
        let post_filter = request.post_filter().map(Matcher::compile).transpose()?;
        let page = request.effective_page();
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let size = usize::try_from(page.size()).unwrap_or(usize::MAX);

        let documents = self.read()?;
        let matched: Vec<&StoredArticle> = documents
            .iter()
            .filter(|doc| query.matches(&doc.source))
            .filter(|doc| post_filter.as_ref().is_none_or(|f| f.matches(&doc.source)))
            .collect();

        let hits = matched
            .iter()
            .skip(offset)
            .take(size)
            .map(|doc| SearchHit {
                id: doc.id.to_string(),
                score: None,
                content: doc.article.clone(),
            })
            .collect();

        Ok(SearchHits::new(matched.len() as u64, None, hits))
    }
}
