//! Typed subset of the engine's query DSL plus the two ways repository
//! methods describe their queries: method-name derivation and JSON templates.

use crate::domain::article::mapping::{FieldType, resolve_property};
use crate::domain::errors::{DomainError, DomainResult};
use regex::Regex;
use serde_json::{Map, Value, json};
use std::sync::OnceLock;

/// Template behind `find_by_authors_name_using_custom_query`.
pub const AUTHORS_NAME_QUERY: &str = r#"{"bool": {"must": [{"match": {"authors.name": "?0"}}]}}"#;

/// Method name behind `find_by_authors_name`.
pub const FIND_BY_AUTHORS_NAME: &str = "findByAuthorsName";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    MatchAll,
    Match { field: String, query: String },
    Term { field: String, value: String },
    Regexp { field: String, pattern: String },
    Fuzzy { field: String, value: String },
    Bool(BoolQuery),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoolQuery {
    pub must: Vec<SearchQuery>,
    pub filter: Vec<SearchQuery>,
    pub should: Vec<SearchQuery>,
    pub must_not: Vec<SearchQuery>,
}

impl BoolQuery {
    pub fn must(mut self, query: SearchQuery) -> Self {
        self.must.push(query);
        self
    }

    pub fn filter(mut self, query: SearchQuery) -> Self {
        self.filter.push(query);
        self
    }

    pub fn should(mut self, query: SearchQuery) -> Self {
        self.should.push(query);
        self
    }

    pub fn must_not(mut self, query: SearchQuery) -> Self {
        self.must_not.push(query);
        self
    }
}

impl From<BoolQuery> for SearchQuery {
    fn from(value: BoolQuery) -> Self {
        Self::Bool(value)
    }
}

impl SearchQuery {
    pub fn match_text(field: impl Into<String>, query: impl Into<String>) -> Self {
        Self::Match {
            field: field.into(),
            query: query.into(),
        }
    }

    pub fn term(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Term {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn regexp(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Regexp {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    pub fn fuzzy(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Fuzzy {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn bool() -> BoolQuery {
        BoolQuery::default()
    }

    /// Encode as engine query DSL.
    pub fn to_json(&self) -> Value {
        match self {
            Self::MatchAll => json!({ "match_all": {} }),
            Self::Match { field, query } => json!({ "match": { field.as_str(): query } }),
            Self::Term { field, value } => json!({ "term": { field.as_str(): value } }),
            Self::Regexp { field, pattern } => {
                json!({ "regexp": { field.as_str(): { "value": pattern } } })
            }
            Self::Fuzzy { field, value } => {
                json!({ "fuzzy": { field.as_str(): { "value": value, "fuzziness": "AUTO" } } })
            }
            Self::Bool(query) => {
                let mut body = Map::new();
                for (name, clauses) in [
                    ("must", &query.must),
                    ("filter", &query.filter),
                    ("should", &query.should),
                    ("must_not", &query.must_not),
                ] {
                    if !clauses.is_empty() {
                        let encoded = clauses.iter().map(Self::to_json).collect();
                        body.insert(name.into(), Value::Array(encoded));
                    }
                }
                json!({ "bool": body })
            }
        }
    }

    /// Decode the supported subset of engine query DSL.
    pub fn from_json(value: &Value) -> DomainResult<Self> {
        let (kind, body) = single_entry(value, "query")?;
        match kind.as_str() {
            "match_all" => Ok(Self::MatchAll),
            "match" => {
                let (field, query) = field_value(body, "query")?;
                Ok(Self::Match { field, query })
            }
            "term" => {
                let (field, value) = field_value(body, "value")?;
                Ok(Self::Term { field, value })
            }
            "regexp" => {
                let (field, pattern) = field_value(body, "value")?;
                Ok(Self::Regexp { field, pattern })
            }
            "fuzzy" => {
                let (field, value) = field_value(body, "value")?;
                Ok(Self::Fuzzy { field, value })
            }
            "bool" => {
                let Value::Object(clauses) = body else {
                    return Err(DomainError::malformed_query("bool body must be an object"));
                };
                let mut query = BoolQuery::default();
                for (name, clause) in clauses {
                    let target = match name.as_str() {
                        "must" => &mut query.must,
                        "filter" => &mut query.filter,
                        "should" => &mut query.should,
                        "must_not" => &mut query.must_not,
                        other => {
                            return Err(DomainError::malformed_query(format!(
                                "unsupported bool clause `{other}`"
                            )));
                        }
                    };
                    match clause {
                        Value::Array(items) => {
                            for item in items {
                                target.push(Self::from_json(item)?);
                            }
                        }
                        single => target.push(Self::from_json(single)?),
                    }
                }
                Ok(Self::Bool(query))
            }
            other => Err(DomainError::malformed_query(format!(
                "unsupported query type `{other}`"
            ))),
        }
    }
}

fn single_entry<'a>(value: &'a Value, what: &str) -> DomainResult<(&'a String, &'a Value)> {
    let Value::Object(map) = value else {
        return Err(DomainError::malformed_query(format!(
            "{what} must be a JSON object"
        )));
    };
    let mut entries = map.iter();
    match (entries.next(), entries.next()) {
        (Some(entry), None) => Ok(entry),
        _ => Err(DomainError::malformed_query(format!(
            "{what} must have exactly one key"
        ))),
    }
}

// Accepts both `{"field": "value"}` and `{"field": {"<key>": "value", ...}}`.
fn field_value(body: &Value, key: &str) -> DomainResult<(String, String)> {
    let (field, inner) = single_entry(body, "field clause")?;
    let value = match inner {
        Value::Object(options) => options.get(key).ok_or_else(|| {
            DomainError::malformed_query(format!("field `{field}` is missing `{key}`"))
        })?,
        other => other,
    };
    let value = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => {
            return Err(DomainError::malformed_query(format!(
                "field `{field}` must have a scalar value"
            )));
        }
    };
    Ok((field.clone(), value))
}

/// A query derived from a repository method name such as `findByAuthorsName`.
///
/// The subject prefix (`find`, `read`, `get`, `query`, `search`, `stream`) is
/// followed by `By` and property expressions joined with `And` / `Or`. Each
/// property is resolved against the article mapping; `text` properties become
/// analysed `match` criteria, `keyword` properties exact `term` criteria.
#[derive(Debug, Clone)]
pub struct DerivedQuery {
    method: String,
    or_parts: Vec<Vec<Criterion>>,
}

#[derive(Debug, Clone)]
struct Criterion {
    path: String,
    field_type: FieldType,
}

fn method_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:find|read|get|query|search|stream)(?:\p{Lu}\w*?)??By(\p{Lu}\w*)$")
            .expect("query method pattern is valid")
    })
}

impl DerivedQuery {
    pub fn parse(method: &str) -> DomainResult<Self> {
        let captures = method_pattern().captures(method).ok_or_else(|| {
            DomainError::validation(format!("`{method}` is not a derivable query method"))
        })?;
        let predicate = captures.get(1).map_or("", |m| m.as_str());

        let mut or_parts = Vec::new();
        for or_part in split_keyword(predicate, "Or") {
            let mut criteria = Vec::new();
            for expression in split_keyword(&or_part, "And") {
                let field = resolve_property(&expression).ok_or_else(|| {
                    DomainError::validation(format!(
                        "no property `{expression}` found for `{method}`"
                    ))
                })?;
                if field.field_type == FieldType::Nested {
                    return Err(DomainError::validation(format!(
                        "`{}` is a nested object, not a queryable value",
                        field.path
                    )));
                }
                criteria.push(Criterion {
                    path: field.path,
                    field_type: field.field_type,
                });
            }
            or_parts.push(criteria);
        }

        Ok(Self {
            method: method.to_string(),
            or_parts,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn parameter_count(&self) -> usize {
        self.or_parts.iter().map(Vec::len).sum()
    }

    /// Field paths in parameter order.
    pub fn fields(&self) -> Vec<&str> {
        self.or_parts
            .iter()
            .flatten()
            .map(|criterion| criterion.path.as_str())
            .collect()
    }

    pub fn bind(&self, args: &[&str]) -> DomainResult<SearchQuery> {
        if args.len() != self.parameter_count() {
            return Err(DomainError::validation(format!(
                "`{}` expects {} argument(s), got {}",
                self.method,
                self.parameter_count(),
                args.len()
            )));
        }

        let mut args = args.iter();
        let mut groups = Vec::with_capacity(self.or_parts.len());
        for criteria in &self.or_parts {
            let mut group = SearchQuery::bool();
            for (criterion, arg) in criteria.iter().zip(args.by_ref()) {
                let clause = match criterion.field_type {
                    FieldType::Keyword => SearchQuery::term(&criterion.path, *arg),
                    _ => SearchQuery::match_text(&criterion.path, *arg),
                };
                group = group.must(clause);
            }
            groups.push(group);
        }

        if groups.len() == 1 {
            return Ok(groups.remove(0).into());
        }
        let combined = groups
            .into_iter()
            .fold(SearchQuery::bool(), |query, group| query.should(group.into()));
        Ok(combined.into())
    }
}

// Splits `TitleAndAuthorsName` on a capitalised keyword that starts a new word.
fn split_keyword(expression: &str, keyword: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut rest = expression;
    let mut search_from = 0;
    while let Some(offset) = rest[search_from..].find(keyword) {
        let at = search_from + offset;
        let after = &rest[at + keyword.len()..];
        let starts_word = after.chars().next().is_some_and(char::is_uppercase);
        if at > 0 && starts_word {
            parts.push(rest[..at].to_string());
            rest = after;
            search_from = 0;
        } else {
            search_from = at + keyword.len();
        }
    }
    parts.push(rest.to_string());
    parts
}

/// A JSON query with positional `?0`, `?1`, ... placeholders.
///
/// Arguments are JSON-string escaped before substitution, so placeholders are
/// expected inside string literals of the template.
#[derive(Debug, Clone)]
pub struct QueryTemplate {
    source: String,
}

impl QueryTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn render(&self, args: &[&str]) -> DomainResult<SearchQuery> {
        let rendered = self.substitute(args)?;
        let value: Value = serde_json::from_str(&rendered)
            .map_err(|err| DomainError::malformed_query(format!("invalid query template: {err}")))?;
        SearchQuery::from_json(&value)
    }

    fn substitute(&self, args: &[&str]) -> DomainResult<String> {
        let mut out = String::with_capacity(self.source.len());
        let mut chars = self.source.char_indices().peekable();
        while let Some((_, ch)) = chars.next() {
            if ch != '?' {
                out.push(ch);
                continue;
            }
            let mut digits = String::new();
            while let Some((_, next)) = chars.peek() {
                if next.is_ascii_digit() {
                    digits.push(*next);
                    chars.next();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                out.push(ch);
                continue;
            }
            let index: usize = digits
                .parse()
                .map_err(|_| DomainError::malformed_query(format!("bad placeholder ?{digits}")))?;
            let arg = args.get(index).ok_or_else(|| {
                DomainError::malformed_query(format!(
                    "placeholder ?{index} has no argument ({} given)",
                    args.len()
                ))
            })?;
            out.push_str(&escape_json_string(arg));
        }
        Ok(out)
    }
}

fn escape_json_string(raw: &str) -> String {
    let quoted = Value::String(raw.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
