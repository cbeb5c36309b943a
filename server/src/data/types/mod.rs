//! Shared data types for the span and evaluation stores
//!
//! These types model the records returned by the upstream query services and
//! are shared by every store implementation.

mod evaluations;
mod spans;

pub use evaluations::EvaluationRecord;
pub use spans::{AttributeFilter, AttributeValue, SpanQuery, SpanRecord};
