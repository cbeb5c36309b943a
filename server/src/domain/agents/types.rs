//! Aggregation output types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Score statistics for one evaluation metric
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EvalStats {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Operational summary of one agent over the requested period
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub agent_name: String,
    pub invocations: u64,
    pub errors: u64,
    pub error_rate: f64,
    pub rate_limit_count: u64,
    pub avg_output_size: i64,
    /// Distinct session count, never smaller than `session_ids.len()`
    pub session_count: usize,
    pub session_ids: Vec<String>,
    pub session_ids_truncated: bool,
    pub trace_ids_total: usize,
    pub trace_ids: Vec<String>,
    pub trace_ids_truncated: bool,
    pub source_types: BTreeMap<String, u64>,
    /// Invocations per UTC day, oldest first
    pub daily_counts: Vec<u64>,
    pub eval_summary: BTreeMap<String, EvalStats>,
}

/// Aggregation result with the echoed period bounds
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentActivityReport {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub day_count: i64,
    pub agents: Vec<AgentSummary>,
}
