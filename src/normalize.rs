//! Field extraction and validation for raw Article Search documents.
//!
//! The Article Search API returns deeply nested documents whose fields are
//! inconsistently present: `headline` is a mapping with optional sub-fields,
//! `keywords` is a list of tagged objects, `multimedia` buries the lead image
//! URL three levels down, and any of them may be missing outright. This
//! module flattens one such document into a [`FlatArticle`] with a fixed
//! column set.
//!
//! # Extraction strategies
//!
//! Each output column is populated by one of three strategies, declared in a
//! data-driven catalog rather than probed at runtime:
//!
//! - [`Extraction::DottedPath`]: walk a dotted path (e.g. `headline.main`)
//!   through nested mappings. A missing key or a non-mapping value anywhere
//!   along the path yields `Null` instead of an error (safe navigation).
//! - [`Extraction::KeywordJoin`]: join each keyword element's `value`
//!   sub-field into one comma-delimited string. Malformed elements degrade
//!   the whole field to the empty string rather than failing the record.
//! - [`Extraction::DirectKey`]: copy a top-level field as-is; nested
//!   structures are serialized to a compact JSON string so the flat schema
//!   still holds.
//!
//! The required-field check runs last, over the flattened result. It is the
//! only way `normalize` fails for well-formed input.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::models::{FieldValue, FlatArticle};

/// Fields that must be present for each article unless the caller overrides
/// the set: the record identifier, the main headline, and the publication
/// date.
pub const DEFAULT_REQUIRED_FIELDS: &[&str] = &["_id", "headline", "pub_date"];

/// How a single output column is populated from a raw document.
#[derive(Debug)]
enum Extraction {
    /// Copy a top-level key; nested structures become JSON text.
    DirectKey(&'static str),
    /// Walk a dotted path through nested mappings; any miss yields null.
    DottedPath(&'static str),
    /// Join keyword elements' `value` sub-fields with commas.
    KeywordJoin(&'static str),
}

/// The fixed output catalog: column name and how to fill it, in the order
/// columns appear in exported CSVs. Derived fields come first, then the
/// pass-through fields.
const CATALOG: &[(&str, Extraction)] = &[
    ("headline", Extraction::DottedPath("headline.main")),
    ("headline_kicker", Extraction::DottedPath("headline.kicker")),
    ("headline_print", Extraction::DottedPath("headline.print_headline")),
    ("byline", Extraction::DottedPath("byline.original")),
    ("image_url", Extraction::DottedPath("multimedia.default.url")),
    ("keywords", Extraction::KeywordJoin("keywords")),
    ("_id", Extraction::DirectKey("_id")),
    ("abstract", Extraction::DirectKey("abstract")),
    ("snippet", Extraction::DirectKey("snippet")),
    ("source", Extraction::DirectKey("source")),
    ("print_page", Extraction::DirectKey("print_page")),
    ("document_type", Extraction::DirectKey("document_type")),
    ("web_url", Extraction::DirectKey("web_url")),
    ("pub_date", Extraction::DirectKey("pub_date")),
    ("news_desk", Extraction::DirectKey("news_desk")),
    ("section_name", Extraction::DirectKey("section_name")),
    ("subsection_name", Extraction::DirectKey("subsection_name")),
    ("type_of_material", Extraction::DirectKey("type_of_material")),
    ("word_count", Extraction::DirectKey("word_count")),
    ("uri", Extraction::DirectKey("uri")),
    ("print_section", Extraction::DirectKey("print_section")),
];

/// Output column names in export order.
pub fn output_columns() -> impl Iterator<Item = &'static str> {
    CATALOG.iter().map(|(column, _)| *column)
}

/// Rejected normalizer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required-field name does not exist in the output catalog. Accepting
    /// it would silently disable enforcement for that name, so construction
    /// fails instead.
    #[error("required field `{0}` is not an output column")]
    UnknownRequiredField(String),
}

/// Failure while normalizing one raw article.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// A field in the required set resolved to null after extraction.
    #[error("required field `{field}` is missing from article {article_id}")]
    MissingRequiredField {
        /// The article's `_id`, or `unknown` when absent.
        article_id: String,
        /// The required column that came up null.
        field: &'static str,
    },
    /// Catch-all for any other fault while processing one record.
    #[error("failed to process article {article_id}: {source}")]
    Unexpected {
        /// The article's `_id`, or `unknown` when absent.
        article_id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl NormalizeError {
    /// Identifier of the article this error refers to.
    pub fn article_id(&self) -> &str {
        match self {
            NormalizeError::MissingRequiredField { article_id, .. }
            | NormalizeError::Unexpected { article_id, .. } => article_id,
        }
    }
}

/// Flattens raw Article Search documents into [`FlatArticle`] records.
///
/// Holds only immutable configuration (the required-field set), so a single
/// normalizer can be shared freely across independent batches.
#[derive(Debug)]
pub struct ArticleNormalizer {
    required: Vec<&'static str>,
}

impl ArticleNormalizer {
    /// Create a normalizer enforcing the given required fields.
    ///
    /// Every name must be one of the output columns; an unrecognized name is
    /// a configuration error, not a silently ignored check.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let normalizer = ArticleNormalizer::new(DEFAULT_REQUIRED_FIELDS)?;
    /// ```
    pub fn new<I, S>(required: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields: Vec<&'static str> = Vec::new();
        for name in required {
            let name = name.as_ref();
            match CATALOG.iter().find(|(column, _)| *column == name) {
                Some((column, _)) => {
                    if !fields.contains(column) {
                        fields.push(*column);
                    }
                }
                None => return Err(ConfigError::UnknownRequiredField(name.to_string())),
            }
        }
        Ok(Self { required: fields })
    }

    /// Flatten one raw document into the fixed output schema.
    ///
    /// The output always contains every catalog column. Fails only when a
    /// required field resolves to null (or, in principle, when a nested
    /// structure cannot be serialized).
    pub fn normalize(&self, raw: &Value) -> Result<FlatArticle, NormalizeError> {
        let mut values = HashMap::with_capacity(CATALOG.len());

        for (column, extraction) in CATALOG {
            let value = match extraction {
                Extraction::DottedPath(path) => match resolve_path(raw, path) {
                    Some(found) => self.coerce(raw, found)?,
                    None => FieldValue::Null,
                },
                Extraction::KeywordJoin(key) => join_keywords(raw.get(*key)),
                Extraction::DirectKey(key) => match raw.get(*key) {
                    Some(found) => self.coerce(raw, found)?,
                    None => FieldValue::Null,
                },
            };
            values.insert(*column, value);
        }

        for &field in &self.required {
            if values.get(field).is_some_and(FieldValue::is_null) {
                return Err(NormalizeError::MissingRequiredField {
                    article_id: article_id(raw),
                    field,
                });
            }
        }

        Ok(FlatArticle::new(values))
    }

    fn coerce(&self, raw: &Value, value: &Value) -> Result<FieldValue, NormalizeError> {
        match value {
            Value::Null => Ok(FieldValue::Null),
            Value::String(s) => Ok(FieldValue::Text(s.clone())),
            Value::Number(n) => Ok(FieldValue::Number(n.clone())),
            Value::Bool(b) => Ok(FieldValue::Text(b.to_string())),
            Value::Object(_) | Value::Array(_) => serde_json::to_string(value)
                .map(FieldValue::Json)
                .map_err(|source| NormalizeError::Unexpected {
                    article_id: article_id(raw),
                    source,
                }),
        }
    }
}

/// Walk a dotted path through nested mappings.
///
/// Returns `None` as soon as a segment is absent or the current value is not
/// a mapping. A `None` here is a missing field, not a traversal fault.
fn resolve_path<'a>(raw: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = raw;
    for segment in path.split('.') {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}

/// Join keyword elements into one comma-delimited string.
///
/// An absent, empty, or wrong-shaped `keywords` field produces the empty
/// string: this field is never null and never fails the record. An element
/// missing its `value` sub-field contributes an empty segment; an element of
/// the wrong shape degrades the whole field.
fn join_keywords(value: Option<&Value>) -> FieldValue {
    let Some(Value::Array(elements)) = value else {
        return FieldValue::Text(String::new());
    };

    let mut parts: Vec<&str> = Vec::with_capacity(elements.len());
    for element in elements {
        let Value::Object(map) = element else {
            return FieldValue::Text(String::new());
        };
        match map.get("value") {
            Some(Value::String(s)) => parts.push(s),
            None => parts.push(""),
            Some(_) => return FieldValue::Text(String::new()),
        }
    }
    FieldValue::Text(parts.join(","))
}

fn article_id(raw: &Value) -> String {
    raw.get("_id")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer(required: &[&str]) -> ArticleNormalizer {
        ArticleNormalizer::new(required).expect("valid required fields")
    }

    #[test]
    fn test_output_schema_is_uniform() {
        let normalizer = normalizer(&[]);
        let empty = normalizer.normalize(&json!({})).unwrap();
        let full = normalizer
            .normalize(&json!({
                "_id": "nyt://article/abc",
                "headline": {"main": "Main", "kicker": "Kick"},
                "pub_date": "2024-01-02T00:00:00+0000",
                "word_count": 350
            }))
            .unwrap();

        let expected: std::collections::BTreeSet<_> = output_columns().collect();
        let empty_columns: std::collections::BTreeSet<_> = empty.columns().collect();
        let full_columns: std::collections::BTreeSet<_> = full.columns().collect();

        assert_eq!(expected.len(), 21);
        assert_eq!(empty_columns, expected);
        assert_eq!(full_columns, expected);
    }

    #[test]
    fn test_dotted_path_extraction() {
        let normalizer = normalizer(&[]);

        let present = normalizer
            .normalize(&json!({"headline": {"main": "X"}}))
            .unwrap();
        assert_eq!(
            present.get("headline"),
            Some(&FieldValue::Text("X".to_string()))
        );

        let empty_mapping = normalizer.normalize(&json!({"headline": {}})).unwrap();
        assert_eq!(empty_mapping.get("headline"), Some(&FieldValue::Null));

        let absent = normalizer.normalize(&json!({})).unwrap();
        assert_eq!(absent.get("headline"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_dotted_path_short_circuits_on_non_mapping() {
        let normalizer = normalizer(&[]);
        let flat = normalizer
            .normalize(&json!({"headline": "not a mapping", "byline": 7}))
            .unwrap();
        assert_eq!(flat.get("headline"), Some(&FieldValue::Null));
        assert_eq!(flat.get("byline"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_deep_dotted_path() {
        let normalizer = normalizer(&[]);
        let flat = normalizer
            .normalize(&json!({
                "multimedia": {"default": {"url": "https://example.com/img.jpg"}}
            }))
            .unwrap();
        assert_eq!(
            flat.get("image_url"),
            Some(&FieldValue::Text("https://example.com/img.jpg".to_string()))
        );
    }

    #[test]
    fn test_keywords_joined() {
        let normalizer = normalizer(&[]);
        let flat = normalizer
            .normalize(&json!({"keywords": [{"value": "a"}, {"value": "b"}]}))
            .unwrap();
        assert_eq!(
            flat.get("keywords"),
            Some(&FieldValue::Text("a,b".to_string()))
        );
    }

    #[test]
    fn test_keywords_empty_or_absent() {
        let normalizer = normalizer(&[]);

        let empty = normalizer.normalize(&json!({"keywords": []})).unwrap();
        assert_eq!(empty.get("keywords"), Some(&FieldValue::Text(String::new())));

        let absent = normalizer.normalize(&json!({})).unwrap();
        assert_eq!(
            absent.get("keywords"),
            Some(&FieldValue::Text(String::new()))
        );
    }

    #[test]
    fn test_keywords_missing_value_subfield_contributes_empty_segment() {
        let normalizer = normalizer(&[]);
        let flat = normalizer
            .normalize(&json!({"keywords": [{"value": "a"}, {"name": "glocations"}]}))
            .unwrap();
        assert_eq!(
            flat.get("keywords"),
            Some(&FieldValue::Text("a,".to_string()))
        );
    }

    #[test]
    fn test_malformed_keyword_element_degrades_whole_field() {
        let normalizer = normalizer(&[]);

        let non_object = normalizer
            .normalize(&json!({"keywords": [{"value": "a"}, "oops"]}))
            .unwrap();
        assert_eq!(
            non_object.get("keywords"),
            Some(&FieldValue::Text(String::new()))
        );

        let non_string_value = normalizer
            .normalize(&json!({"keywords": [{"value": 3}]}))
            .unwrap();
        assert_eq!(
            non_string_value.get("keywords"),
            Some(&FieldValue::Text(String::new()))
        );

        let not_a_list = normalizer
            .normalize(&json!({"keywords": "politics"}))
            .unwrap();
        assert_eq!(
            not_a_list.get("keywords"),
            Some(&FieldValue::Text(String::new()))
        );
    }

    #[test]
    fn test_direct_field_copies_scalars() {
        let normalizer = normalizer(&[]);
        let flat = normalizer
            .normalize(&json!({
                "web_url": "https://www.nytimes.com/2024/01/02/us/example.html",
                "word_count": 523
            }))
            .unwrap();
        assert_eq!(
            flat.get("web_url"),
            Some(&FieldValue::Text(
                "https://www.nytimes.com/2024/01/02/us/example.html".to_string()
            ))
        );
        assert_eq!(
            flat.get("word_count"),
            Some(&FieldValue::Number(serde_json::Number::from(523)))
        );
    }

    #[test]
    fn test_structured_direct_field_round_trips() {
        let normalizer = normalizer(&[]);
        let original = json!({"name": "The New York Times", "vernacular": null});
        let flat = normalizer
            .normalize(&json!({"source": original.clone()}))
            .unwrap();

        let Some(FieldValue::Json(encoded)) = flat.get("source") else {
            panic!("structured field should serialize to JSON text");
        };
        let decoded: Value = serde_json::from_str(encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_explicit_null_direct_field_is_null() {
        let normalizer = normalizer(&[]);
        let flat = normalizer.normalize(&json!({"news_desk": null})).unwrap();
        assert_eq!(flat.get("news_desk"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_required_field_missing_raises() {
        let normalizer = normalizer(&["headline"]);
        let err = normalizer
            .normalize(&json!({"_id": "nyt://article/abc", "pub_date": "2024-01-02"}))
            .unwrap_err();

        match err {
            NormalizeError::MissingRequiredField { article_id, field } => {
                assert_eq!(article_id, "nyt://article/abc");
                assert_eq!(field, "headline");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_required_field_error_uses_unknown_for_missing_id() {
        let normalizer = normalizer(&["headline"]);
        let err = normalizer.normalize(&json!({})).unwrap_err();
        assert_eq!(err.article_id(), "unknown");
        assert!(err.to_string().contains("headline"));
    }

    #[test]
    fn test_required_fields_satisfied() {
        let normalizer = normalizer(DEFAULT_REQUIRED_FIELDS);
        let flat = normalizer
            .normalize(&json!({
                "_id": "nyt://article/abc",
                "headline": {"main": "All present"},
                "pub_date": "2024-01-02T00:00:00+0000"
            }))
            .unwrap();
        assert_eq!(
            flat.get("pub_date"),
            Some(&FieldValue::Text("2024-01-02T00:00:00+0000".to_string()))
        );
    }

    #[test]
    fn test_unknown_required_field_rejected_at_construction() {
        let err = ArticleNormalizer::new(["headlin"]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRequiredField(ref name) if name == "headlin"));
    }
}
