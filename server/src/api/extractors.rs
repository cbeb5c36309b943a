//! Query and validation extractors for API routes
//!
//! ## HTTP Caching Strategy
//!
//! | Endpoint Type           | Cache-Control          |
//! |-------------------------|------------------------|
//! | Agent activity          | `no-store`             |
//! | Ingestion               | -                      |
//! | Health / OpenAPI        | -                      |

use std::ops::Deref;

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::domain::agents::PeriodSelector;

/// Raw query extractor for period-scoped routes (internal use)
#[derive(Debug, Deserialize)]
struct PeriodQueryRaw {
    period: Option<String>,
}

/// Validated `?period=` extractor.
///
/// Defaults to `7d` when the parameter is absent. Unknown selectors are
/// rejected with 400 `INVALID_PERIOD` before any data is loaded.
#[derive(Debug)]
pub struct PeriodQuery {
    pub period: PeriodSelector,
}

impl<S> FromRequestParts<S> for PeriodQuery
where
    S: Send + Sync,
{
    type Rejection = ValidationRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(raw) = Query::<PeriodQueryRaw>::from_request_parts(parts, state)
            .await
            .map_err(ValidationRejection::Query)?;

        let period = match raw.period.as_deref() {
            None => PeriodSelector::default(),
            Some(value) => value
                .parse::<PeriodSelector>()
                .map_err(ValidationRejection::InvalidPeriod)?,
        };

        Ok(Self { period })
    }
}

/// Validation rejection with structured error response
pub enum ValidationRejection {
    /// Unknown period selector
    InvalidPeriod(String),
    /// Failed to parse query string
    Query(QueryRejection),
    /// Failed to parse JSON body
    Json(JsonRejection),
    /// Validation constraints not satisfied
    Validation(validator::ValidationErrors),
}

impl IntoResponse for ValidationRejection {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::InvalidPeriod(message) => (StatusCode::BAD_REQUEST, "INVALID_PERIOD", message),
            Self::Query(rejection) => (
                StatusCode::BAD_REQUEST,
                "QUERY_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::Json(rejection) => (
                rejection.status(),
                "JSON_PARSE_ERROR",
                rejection.body_text(),
            ),
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format_validation_errors(&errors),
            ),
        };
        (
            status,
            Json(serde_json::json!({
                "error": "bad_request",
                "code": code,
                "message": message
            })),
        )
            .into_response()
    }
}

fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: validation failed", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// JSON body extractor with automatic validation.
///
/// Deserializes JSON body and validates it using the `validator` crate.
/// Returns a `ValidationRejection` on parse or validation failure.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T> Deref for ValidatedJson<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ValidationRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationRejection::Json)?;
        value.validate().map_err(ValidationRejection::Validation)?;
        Ok(Self(value))
    }
}
