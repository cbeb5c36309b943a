//! Span attribute resolution for agent activity.
//!
//! Span attributes are produced by external instrumentation and are expected to
//! be imperfect. Every reader here degrades to a fixed default instead of failing.

use crate::data::types::{AttributeValue, SpanRecord};

pub mod keys {
    pub const AGENT_NAME: &str = "gen_ai.agent.name";
    pub const HAS_ERROR: &str = "agent.has_error";
    pub const HAS_RATE_LIMIT: &str = "agent.has_rate_limit";
    pub const OUTPUT_SIZE: &str = "agent.output_size";
    pub const SESSION_ID: &str = "session.id";
    pub const SOURCE_TYPE: &str = "agent.source_type";
    pub const OPERATION_NAME: &str = "gen_ai.operation.name";
}

/// Agent name used when a span carries none
pub const UNKNOWN_AGENT: &str = "unknown";

/// Source type used when a span carries none
pub const UNKNOWN_SOURCE_TYPE: &str = "unknown";

/// Bucket for source types outside [`KNOWN_SOURCE_TYPES`]
pub const OTHER_SOURCE_TYPE: &str = "other";

/// Source type labels reported as-is. Anything else folds into `other`.
pub const KNOWN_SOURCE_TYPES: &[&str] = &[
    "api",
    "cli",
    "sdk",
    "web",
    "webhook",
    "scheduled",
    UNKNOWN_SOURCE_TYPE,
];

/// Agent name, `unknown` when missing or blank
pub fn agent_name(span: &SpanRecord) -> String {
    span.attribute(keys::AGENT_NAME)
        .and_then(AttributeValue::as_label)
        .unwrap_or_else(|| UNKNOWN_AGENT.to_string())
}

pub fn has_error(span: &SpanRecord) -> bool {
    flag(span, keys::HAS_ERROR)
}

pub fn has_rate_limit(span: &SpanRecord) -> bool {
    flag(span, keys::HAS_RATE_LIMIT)
}

/// Output size, 0 when missing or not a finite number
pub fn output_size(span: &SpanRecord) -> f64 {
    span.attribute(keys::OUTPUT_SIZE)
        .and_then(AttributeValue::as_f64)
        .unwrap_or(0.0)
}

pub fn session_id(span: &SpanRecord) -> Option<String> {
    span.attribute(keys::SESSION_ID)
        .and_then(AttributeValue::as_label)
}

/// Normalized source type label.
///
/// Lowercased and trimmed; missing values map to `unknown`, unrecognized
/// values to `other`, so the per-agent map stays bounded.
pub fn source_type(span: &SpanRecord) -> &'static str {
    let Some(raw) = span
        .attribute(keys::SOURCE_TYPE)
        .and_then(AttributeValue::as_label)
    else {
        return UNKNOWN_SOURCE_TYPE;
    };
    let normalized = raw.to_ascii_lowercase();
    KNOWN_SOURCE_TYPES
        .iter()
        .find(|known| **known == normalized)
        .copied()
        .unwrap_or(OTHER_SOURCE_TYPE)
}

fn flag(span: &SpanRecord, key: &str) -> bool {
    span.attribute(key).is_some_and(AttributeValue::is_truthy)
}
