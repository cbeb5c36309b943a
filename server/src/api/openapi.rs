//! OpenAPI specification

use axum::http::header;
use axum::response::{IntoResponse, Json};
use utoipa::OpenApi;

use crate::api::routes::{agents, health, ingest};
use crate::data::types::{AttributeValue, EvaluationRecord, SpanRecord};
use crate::domain::agents::{AgentSummary, EvalStats, PeriodSelector};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "AgentDash API",
        version = env!("CARGO_PKG_VERSION"),
        description = "Per-agent activity dashboards over agent spans and evaluation scores"
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "agents", description = "Agent activity aggregation"),
        (name = "ingest", description = "Span and evaluation ingestion")
    ),
    paths(
        health::health,
        agents::get_agent_activity,
        ingest::ingest_spans,
        ingest::ingest_evaluations,
    ),
    components(schemas(
        agents::types::AgentActivityDto,
        AgentSummary,
        EvalStats,
        PeriodSelector,
        SpanRecord,
        AttributeValue,
        EvaluationRecord,
        ingest::SpanBatch,
        ingest::EvaluationBatch,
        ingest::IngestResponse,
    ))
)]
pub struct ApiDoc;

/// Serve OpenAPI JSON specification
pub async fn openapi_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        Json(ApiDoc::openapi()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        assert!(paths.contains(&"/api/v1/health"));
        assert!(paths.contains(&"/api/v1/agents/activity"));
        assert!(paths.contains(&"/api/v1/spans"));
        assert!(paths.contains(&"/api/v1/evaluations"));
    }
}
