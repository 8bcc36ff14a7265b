//! Field-level indexing declaration for [`Article`](super::Article).
//!
//! The engine evaluates this once when the index is created. The same table is
//! consulted when resolving derived queries, so that a property declared as
//! `text` is always queried with analysed matching and a `keyword` property
//! with exact matching.

use serde_json::{Map, Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Analysed full-text field.
    Text,
    /// Exact-value field.
    Keyword,
    /// Array of embedded objects indexed as nested documents.
    Nested,
}

impl FieldType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Keyword => "keyword",
            Self::Nested => "nested",
        }
    }
}

#[derive(Debug)]
pub struct FieldMapping {
    pub name: &'static str,
    pub field_type: FieldType,
    pub properties: &'static [FieldMapping],
    pub sub_fields: &'static [FieldMapping],
    pub include_in_parent: bool,
    pub fielddata: bool,
}

impl FieldMapping {
    pub const fn text(name: &'static str) -> Self {
        Self::leaf(name, FieldType::Text)
    }

    pub const fn keyword(name: &'static str) -> Self {
        Self::leaf(name, FieldType::Keyword)
    }

    pub const fn nested(name: &'static str, properties: &'static [FieldMapping]) -> Self {
        Self {
            name,
            field_type: FieldType::Nested,
            properties,
            sub_fields: &[],
            include_in_parent: true,
            fielddata: false,
        }
    }

    const fn leaf(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            properties: &[],
            sub_fields: &[],
            include_in_parent: false,
            fielddata: false,
        }
    }

    pub const fn with_sub_fields(mut self, sub_fields: &'static [FieldMapping]) -> Self {
        self.sub_fields = sub_fields;
        self
    }

    pub const fn with_fielddata(mut self) -> Self {
        self.fielddata = true;
        self
    }

    fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("type".into(), json!(self.field_type.as_str()));
        if self.fielddata {
            body.insert("fielddata".into(), json!(true));
        }
        if self.include_in_parent {
            body.insert("include_in_parent".into(), json!(true));
        }
        if !self.properties.is_empty() {
            body.insert("properties".into(), properties_json(self.properties));
        }
        if !self.sub_fields.is_empty() {
            body.insert("fields".into(), properties_json(self.sub_fields));
        }
        Value::Object(body)
    }
}

pub const AUTHOR_FIELDS: &[FieldMapping] = &[FieldMapping::text("name")];

const TITLE_SUB_FIELDS: &[FieldMapping] = &[FieldMapping::keyword("verbatim")];

pub const ARTICLE_FIELDS: &[FieldMapping] = &[
    FieldMapping::keyword("id"),
    FieldMapping::text("title")
        .with_fielddata()
        .with_sub_fields(TITLE_SUB_FIELDS),
    FieldMapping::nested("authors", AUTHOR_FIELDS),
];

fn properties_json(fields: &[FieldMapping]) -> Value {
    let properties = fields
        .iter()
        .map(|field| (field.name.to_string(), field.to_json()))
        .collect::<Map<_, _>>();
    Value::Object(properties)
}

/// The `mappings` object sent when creating the article index.
pub fn article_index_mappings() -> Value {
    json!({ "properties": properties_json(ARTICLE_FIELDS) })
}

/// A dotted field path resolved against the declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// Path as the engine addresses it, e.g. `authors.name` or `title.verbatim`.
    pub path: String,
    pub field_type: FieldType,
    /// Location of the value in the stored source; sub-fields read their parent.
    pub source_path: Vec<&'static str>,
}

/// Resolve an engine field path such as `authors.name`.
pub fn resolve_path(path: &str) -> Option<ResolvedField> {
    let mut fields = ARTICLE_FIELDS;
    let mut source_path = Vec::new();
    let mut resolved: Option<&FieldMapping> = None;
    let mut sub_field: Option<&FieldMapping> = None;

    for segment in path.split('.') {
        if sub_field.is_some() {
            return None;
        }
        if let Some(parent) = resolved {
            if let Some(sub) = parent.sub_fields.iter().find(|field| field.name == segment) {
                sub_field = Some(sub);
                continue;
            }
            fields = parent.properties;
        }
        let field = fields.iter().find(|field| field.name == segment)?;
        source_path.push(field.name);
        resolved = Some(field);
    }

    let leaf = sub_field.or(resolved)?;
    Some(ResolvedField {
        path: path.to_string(),
        field_type: leaf.field_type,
        source_path,
    })
}

/// Resolve a capitalised property expression from a repository method name,
/// e.g. `AuthorsName` to `authors.name`.
///
/// Longer prefixes win, so a property literally called `authorsName` would be
/// preferred over traversing `authors` then `name`.
pub fn resolve_property(expression: &str) -> Option<ResolvedField> {
    let words = split_camel_case(expression);
    if words.is_empty() {
        return None;
    }
    let mut segments = Vec::new();
    if resolve_words(ARTICLE_FIELDS, &words, &mut segments) {
        resolve_path(&segments.join("."))
    } else {
        None
    }
}

fn resolve_words(fields: &[FieldMapping], words: &[String], segments: &mut Vec<String>) -> bool {
    if words.is_empty() {
        return true;
    }
    for take in (1..=words.len()).rev() {
        let candidate = property_name(&words[..take]);
        let Some(field) = fields.iter().find(|field| field.name == candidate) else {
            continue;
        };
        segments.push(candidate);
        let children = if field.properties.is_empty() {
            field.sub_fields
        } else {
            field.properties
        };
        if resolve_words(children, &words[take..], segments) {
            return true;
        }
        segments.pop();
    }
    false
}

fn property_name(words: &[String]) -> String {
    let mut name = String::new();
    for (index, word) in words.iter().enumerate() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if index == 0 {
                name.extend(first.to_lowercase());
            } else {
                name.extend(first.to_uppercase());
            }
            name.push_str(chars.as_str());
        }
    }
    name
}

fn split_camel_case(expression: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for ch in expression.chars() {
        if ch.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_mappings_declare_field_types() {
        let mappings = article_index_mappings();
        let properties = &mappings["properties"];
        assert_eq!(properties["id"]["type"], "keyword");
        assert_eq!(properties["title"]["type"], "text");
        assert_eq!(properties["title"]["fields"]["verbatim"]["type"], "keyword");
        assert_eq!(properties["authors"]["type"], "nested");
        assert_eq!(properties["authors"]["include_in_parent"], true);
        assert_eq!(properties["authors"]["properties"]["name"]["type"], "text");
    }

    #[test]
    fn resolves_nested_path() {
        let field = resolve_path("authors.name").unwrap();
        assert_eq!(field.field_type, FieldType::Text);
        assert_eq!(field.source_path, ["authors", "name"]);
    }

    #[test]
    fn sub_field_reads_parent_source() {
        let field = resolve_path("title.verbatim").unwrap();
        assert_eq!(field.field_type, FieldType::Keyword);
        assert_eq!(field.source_path, ["title"]);
    }

    #[test]
    fn unknown_paths_do_not_resolve() {
        assert!(resolve_path("authors.email").is_none());
        assert!(resolve_path("title.verbatim.more").is_none());
        assert!(resolve_path("").is_none());
    }

    #[test]
    fn resolves_method_name_properties() {
        assert_eq!(resolve_property("AuthorsName").unwrap().path, "authors.name");
        assert_eq!(resolve_property("Title").unwrap().path, "title");
        assert_eq!(
            resolve_property("TitleVerbatim").unwrap().path,
            "title.verbatim"
        );
        assert!(resolve_property("AuthorsEmail").is_none());
        assert!(resolve_property("").is_none());
    }
}
