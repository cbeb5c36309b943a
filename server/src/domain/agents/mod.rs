//! Agent activity aggregation
//!
//! - `attributes` - Span attribute readers with documented defaults
//! - `period` - Aggregation windows and API period selectors
//! - `aggregator` - Span aggregation, evaluation join and summary
//! - `service` - Span loading and bounded evaluation lookup around the aggregator
//! - `types` - Aggregation output types

pub mod aggregator;
pub mod attributes;
pub mod period;
pub mod service;
pub mod types;

pub use aggregator::{AgentActivityAggregator, AggregationError, AggregatorOptions};
pub use period::{AggregationPeriod, PeriodSelector};
pub use service::{ActivityError, AgentActivityService};
pub use types::{AgentActivityReport, AgentSummary, EvalStats};
