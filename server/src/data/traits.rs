//! Repository traits for span and evaluation stores
//!
//! The aggregation pipeline never talks to a concrete backend. Hosts inject
//! implementations of these traits, so the in-memory store and any remote
//! query service are interchangeable.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::data::error::DataError;
use crate::data::types::{EvaluationRecord, SpanQuery, SpanRecord};

/// Span query service
#[async_trait]
pub trait SpanRepository: Send + Sync {
    /// Spans matching the attribute filter whose start time lies in
    /// `[from_timestamp, to_timestamp]`. When more than `limit` match, the most
    /// recently recorded `limit` are returned.
    async fn query_spans(&self, query: &SpanQuery) -> Result<Vec<SpanRecord>, DataError>;
}

/// Evaluation query service
#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    /// Evaluation records attached to any of `trace_ids` within the date range
    async fn load_evaluations_by_trace_ids(
        &self,
        trace_ids: &[String],
        from_timestamp: DateTime<Utc>,
        to_timestamp: DateTime<Utc>,
    ) -> Result<Vec<EvaluationRecord>, DataError>;
}

#[async_trait]
impl<T: SpanRepository + ?Sized> SpanRepository for Arc<T> {
    async fn query_spans(&self, query: &SpanQuery) -> Result<Vec<SpanRecord>, DataError> {
        self.as_ref().query_spans(query).await
    }
}

#[async_trait]
impl<T: EvaluationRepository + ?Sized> EvaluationRepository for Arc<T> {
    async fn load_evaluations_by_trace_ids(
        &self,
        trace_ids: &[String],
        from_timestamp: DateTime<Utc>,
        to_timestamp: DateTime<Utc>,
    ) -> Result<Vec<EvaluationRecord>, DataError> {
        self.as_ref()
            .load_evaluations_by_trace_ids(trace_ids, from_timestamp, to_timestamp)
            .await
    }
}

/// Evaluation repository wrapper that bounds each call with a timeout.
///
/// Timeout policy belongs to the host, not to the aggregator, so the API layer
/// wraps the injected repository before handing it over.
pub struct TimeoutEvaluations<'a, E: ?Sized> {
    inner: &'a E,
    timeout: Duration,
}

impl<'a, E: EvaluationRepository + ?Sized> TimeoutEvaluations<'a, E> {
    pub fn new(inner: &'a E, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<'a, E: EvaluationRepository + ?Sized> EvaluationRepository for TimeoutEvaluations<'a, E> {
    async fn load_evaluations_by_trace_ids(
        &self,
        trace_ids: &[String],
        from_timestamp: DateTime<Utc>,
        to_timestamp: DateTime<Utc>,
    ) -> Result<Vec<EvaluationRecord>, DataError> {
        tokio::time::timeout(
            self.timeout,
            self.inner
                .load_evaluations_by_trace_ids(trace_ids, from_timestamp, to_timestamp),
        )
        .await
        .map_err(|_| {
            tracing::warn!(
                timeout_secs = self.timeout.as_secs(),
                "Evaluation query timed out"
            );
            DataError::timeout("evaluations", self.timeout.as_secs())
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowEvaluations;

    #[async_trait]
    impl EvaluationRepository for SlowEvaluations {
        async fn load_evaluations_by_trace_ids(
            &self,
            _trace_ids: &[String],
            _from_timestamp: DateTime<Utc>,
            _to_timestamp: DateTime<Utc>,
        ) -> Result<Vec<EvaluationRecord>, DataError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    struct FastEvaluations;

    #[async_trait]
    impl EvaluationRepository for FastEvaluations {
        async fn load_evaluations_by_trace_ids(
            &self,
            trace_ids: &[String],
            _from_timestamp: DateTime<Utc>,
            _to_timestamp: DateTime<Utc>,
        ) -> Result<Vec<EvaluationRecord>, DataError> {
            Ok(trace_ids
                .iter()
                .map(|id| EvaluationRecord {
                    trace_id: Some(id.clone()),
                    evaluation_name: "relevance".to_string(),
                    score_value: Some(1.0),
                })
                .collect())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_evaluations_times_out() {
        let inner = SlowEvaluations;
        let bounded = TimeoutEvaluations::new(&inner, Duration::from_secs(5));
        let now = Utc::now();
        let err = bounded
            .load_evaluations_by_trace_ids(&["t1".to_string()], now, now)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DataError::Timeout {
                backend: "evaluations",
                timeout_secs: 5
            }
        ));
    }

    #[tokio::test]
    async fn test_timeout_evaluations_passes_through() {
        let inner = FastEvaluations;
        let bounded = TimeoutEvaluations::new(&inner, Duration::from_secs(5));
        let now = Utc::now();
        let records = bounded
            .load_evaluations_by_trace_ids(&["t1".to_string(), "t2".to_string()], now, now)
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
    }
}
