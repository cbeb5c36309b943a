//! Agent activity DTOs

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::agents::{AgentActivityReport, AgentSummary, PeriodSelector};

/// Agent activity response
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AgentActivityDto {
    pub period: PeriodSelector,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Agents sorted by invocations, descending
    pub agents: Vec<AgentSummary>,
}

impl AgentActivityDto {
    pub fn new(period: PeriodSelector, report: AgentActivityReport) -> Self {
        Self {
            period,
            start_date: report.start_date,
            end_date: report.end_date,
            agents: report.agents,
        }
    }
}
