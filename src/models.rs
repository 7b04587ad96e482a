//! Data models for flat article records and batch results.
//!
//! This module defines the core data structures shared across the pipeline:
//! - [`FieldValue`]: a single scalar cell of a flattened article
//! - [`FlatArticle`]: one article normalized to the fixed flat schema
//! - [`BatchReport`]: the ordered outcome of processing a batch
//!
//! A `FlatArticle` always carries the same column set regardless of which
//! fields the raw API document actually contained; absent fields are `Null`.
//! That uniformity is what lets the CSV sink write every record against one
//! fixed header.

use std::collections::HashMap;
use std::fmt;

use serde_json::Number;

/// A single cell value in a flattened article record.
///
/// The Article Search API nests structures arbitrarily deep; after
/// normalization every output field is one of these four shapes. `Json`
/// carries the compact serialization of a nested mapping or sequence that has
/// no dedicated extraction rule, so no information is lost crossing into the
/// flat schema.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// A plain string value.
    Text(String),
    /// A numeric value, kept as JSON's arbitrary-precision number.
    Number(Number),
    /// A nested structure serialized to a compact JSON string.
    Json(String),
    /// The field was absent or resolved to null.
    Null,
}

impl FieldValue {
    /// Whether this value is `Null`. Required-field enforcement keys off this.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Json(s) => f.write_str(s),
            FieldValue::Null => Ok(()),
        }
    }
}

/// One article normalized to the fixed flat schema.
///
/// Produced exclusively by [`crate::normalize::ArticleNormalizer`]; the value
/// map always contains exactly the catalog's output columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatArticle {
    values: HashMap<&'static str, FieldValue>,
}

impl FlatArticle {
    pub(crate) fn new(values: HashMap<&'static str, FieldValue>) -> Self {
        Self { values }
    }

    /// Look up a column by name.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }

    /// The column names present in this record (unordered).
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }
}

/// The outcome of processing one batch of raw articles.
///
/// `records` preserves the input order (which mirrors pagination order from
/// the API). In lenient mode `records.len() + error_count` equals the input
/// length; in strict mode a failing batch never produces a report at all.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Successfully normalized articles, in input order.
    pub records: Vec<FlatArticle>,
    /// Number of records that failed normalization and were skipped.
    pub error_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_display() {
        assert_eq!(FieldValue::Text("hello".to_string()).to_string(), "hello");
        assert_eq!(FieldValue::Number(Number::from(42)).to_string(), "42");
        assert_eq!(
            FieldValue::Json(r#"{"a":1}"#.to_string()).to_string(),
            r#"{"a":1}"#
        );
        assert_eq!(FieldValue::Null.to_string(), "");
    }

    #[test]
    fn test_field_value_is_null() {
        assert!(FieldValue::Null.is_null());
        assert!(!FieldValue::Text(String::new()).is_null());
        assert!(!FieldValue::Number(Number::from(0)).is_null());
    }

    #[test]
    fn test_flat_article_lookup() {
        let mut values = HashMap::new();
        values.insert("headline", FieldValue::Text("Test".to_string()));
        values.insert("byline", FieldValue::Null);
        let article = FlatArticle::new(values);

        assert_eq!(
            article.get("headline"),
            Some(&FieldValue::Text("Test".to_string()))
        );
        assert_eq!(article.get("byline"), Some(&FieldValue::Null));
        assert_eq!(article.get("missing"), None);
        assert_eq!(article.columns().count(), 2);
    }
}
