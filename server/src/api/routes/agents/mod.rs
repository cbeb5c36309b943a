//! Agent activity API endpoints

pub mod types;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::extractors::PeriodQuery;
use crate::api::types::ApiError;
use crate::domain::agents::AgentActivityService;
use types::AgentActivityDto;

/// Shared state for agent endpoints
#[derive(Clone)]
pub struct AgentsApiState {
    pub activity: Arc<AgentActivityService>,
}

/// Build agent API routes
pub fn routes(activity: Arc<AgentActivityService>) -> Router<()> {
    Router::new()
        .route("/activity", get(get_agent_activity))
        .with_state(AgentsApiState { activity })
}

/// Per-agent activity over a trailing period
#[utoipa::path(
    get,
    path = "/api/v1/agents/activity",
    tag = "agents",
    params(
        ("period" = Option<String>, Query, description = "Trailing window: 24h, 7d (default) or 30d")
    ),
    responses(
        (status = 200, description = "Per-agent activity summaries", body = AgentActivityDto),
        (status = 400, description = "Invalid period"),
        (status = 500, description = "Span or evaluation loading failed")
    )
)]
pub async fn get_agent_activity(
    State(state): State<AgentsApiState>,
    query: PeriodQuery,
) -> Result<(HeaderMap, Json<AgentActivityDto>), ApiError> {
    let report = state
        .activity
        .activity_for(query.period, Utc::now())
        .await
        .map_err(ApiError::from_activity)?;

    tracing::debug!(
        period = %query.period,
        agents = report.agents.len(),
        "Agent activity served"
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok((headers, Json(AgentActivityDto::new(query.period, report))))
}
