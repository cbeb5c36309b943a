//! Domain logic for agent activity dashboards
//!
//! - `agents` - Per-agent activity aggregation joined with evaluation scores

pub mod agents;

pub use agents::{
    ActivityError, AgentActivityAggregator, AgentActivityService, AggregationError,
    AggregationPeriod, PeriodSelector,
};
