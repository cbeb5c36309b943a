//! Span and evaluation ingestion endpoints
//!
//! Appends JSON batches to the in-memory store. Retention caps apply on insert.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::types::validate_batch;
use crate::core::constants::INGEST_BODY_LIMIT;
use crate::data::MemoryStore;
use crate::data::types::{EvaluationRecord, SpanRecord};

/// Shared state for ingestion endpoints
#[derive(Clone)]
pub struct IngestApiState {
    pub store: Arc<MemoryStore>,
}

/// Build ingestion routes
pub fn routes(store: Arc<MemoryStore>) -> Router<()> {
    Router::new()
        .route("/spans", post(ingest_spans))
        .route("/evaluations", post(ingest_evaluations))
        .layer(DefaultBodyLimit::max(INGEST_BODY_LIMIT))
        .with_state(IngestApiState { store })
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SpanBatch {
    #[validate(custom(function = "validate_batch"))]
    pub spans: Vec<SpanRecord>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EvaluationBatch {
    #[validate(custom(function = "validate_batch"))]
    pub evaluations: Vec<EvaluationRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub accepted: usize,
}

/// Append a batch of spans
#[utoipa::path(
    post,
    path = "/api/v1/spans",
    tag = "ingest",
    request_body = SpanBatch,
    responses(
        (status = 202, description = "Spans accepted", body = IngestResponse),
        (status = 400, description = "Malformed or oversized batch")
    )
)]
pub async fn ingest_spans(
    State(state): State<IngestApiState>,
    ValidatedJson(batch): ValidatedJson<SpanBatch>,
) -> (StatusCode, Json<IngestResponse>) {
    let accepted = state.store.insert_spans(batch.spans);
    tracing::debug!(accepted, total = state.store.span_count(), "Spans ingested");
    (StatusCode::ACCEPTED, Json(IngestResponse { accepted }))
}

/// Append a batch of evaluation records
#[utoipa::path(
    post,
    path = "/api/v1/evaluations",
    tag = "ingest",
    request_body = EvaluationBatch,
    responses(
        (status = 202, description = "Evaluations accepted", body = IngestResponse),
        (status = 400, description = "Malformed or oversized batch")
    )
)]
pub async fn ingest_evaluations(
    State(state): State<IngestApiState>,
    ValidatedJson(batch): ValidatedJson<EvaluationBatch>,
) -> (StatusCode, Json<IngestResponse>) {
    let accepted = state.store.insert_evaluations(batch.evaluations);
    tracing::debug!(
        accepted,
        total = state.store.evaluation_count(),
        "Evaluations ingested"
    );
    (StatusCode::ACCEPTED, Json(IngestResponse { accepted }))
}
