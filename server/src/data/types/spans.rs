//! Span records and span query parameters

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Scalar attribute value attached to a span.
///
/// Attribute maps are produced by external instrumentation, so values arrive
/// as whatever JSON the exporter chose (`"true"` vs `true`, `"128"` vs `128`).
/// Nulls, arrays and objects land in `Other` and read as absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Other(serde_json::Value),
}

impl AttributeValue {
    /// Truthiness of the value.
    ///
    /// Strings are truthy only for `true`, `1` or `yes` (case-insensitive).
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0 && !f.is_nan(),
            Self::String(s) => {
                let s = s.trim();
                s.eq_ignore_ascii_case("true") || s == "1" || s.eq_ignore_ascii_case("yes")
            }
            Self::Other(_) => false,
        }
    }

    /// Finite numeric value, parsing numeric strings
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Self::Int(i) => *i as f64,
            Self::Float(f) => *f,
            Self::String(s) => s.trim().parse::<f64>().ok()?,
            Self::Bool(_) | Self::Other(_) => return None,
        };
        value.is_finite().then_some(value)
    }

    /// Non-empty textual form of the value
    pub fn as_label(&self) -> Option<String> {
        let label = match self {
            Self::String(s) => s.trim().to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Other(_) => return None,
        };
        (!label.is_empty()).then_some(label)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

/// A single recorded unit of agent execution
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpanRecord {
    pub trace_id: String,
    pub start_time_unix_nano: u64,
    #[serde(default)]
    pub attributes: HashMap<String, AttributeValue>,
}

impl SpanRecord {
    /// Attribute value by key; `Other` values count as missing
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes
            .get(key)
            .filter(|v| !matches!(v, AttributeValue::Other(_)))
    }
}

/// Attribute predicate applied by the span store
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeFilter {
    /// Attribute key is present with any value
    Exists(String),
    /// Attribute key is present and its label equals the value
    Equals(String, String),
}

impl AttributeFilter {
    pub fn matches(&self, span: &SpanRecord) -> bool {
        match self {
            Self::Exists(key) => span.attribute(key).is_some(),
            Self::Equals(key, expected) => span
                .attribute(key)
                .and_then(AttributeValue::as_label)
                .is_some_and(|v| v == *expected),
        }
    }
}

/// Parameters for a span query
#[derive(Debug, Clone)]
pub struct SpanQuery {
    pub filter: AttributeFilter,
    pub from_timestamp: DateTime<Utc>,
    pub to_timestamp: DateTime<Utc>,
    pub limit: usize,
}
