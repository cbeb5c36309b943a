//! Shared API types
//!
//! Error handling and batch validation shared by all endpoints.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use validator::ValidationError;

use crate::core::constants::MAX_INGEST_BATCH;
use crate::data::DataError;
use crate::domain::agents::{ActivityError, AggregationError};

/// Validator function for ingestion batch sizes
pub fn validate_batch<T>(items: &[T]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::new("batch_empty").with_message("Batch cannot be empty".into()));
    }
    if items.len() > MAX_INGEST_BATCH {
        return Err(ValidationError::new("batch_too_large").with_message(
            format!(
                "Cannot ingest more than {} records at once",
                MAX_INGEST_BATCH
            )
            .into(),
        ));
    }
    Ok(())
}

/// Standard API error response
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: String, message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn from_data(e: DataError) -> Self {
        tracing::error!(
            error = %e,
            backend = e.backend(),
            transient = e.is_transient(),
            "Data error"
        );
        Self::internal("Data operation failed")
    }

    pub fn from_aggregation(e: AggregationError) -> Self {
        match e {
            AggregationError::InvalidDayCount { .. } => {
                Self::bad_request("INVALID_DAY_COUNT", e.to_string())
            }
            AggregationError::Evaluations(e) => Self::from_data(e),
        }
    }

    pub fn from_activity(e: ActivityError) -> Self {
        match e {
            ActivityError::Spans(e) => Self::from_data(e),
            ActivityError::Aggregation(e) => Self::from_aggregation(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, "bad_request", code, message)
            }
            Self::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "INTERNAL".to_string(),
                message,
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": error_type,
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}
