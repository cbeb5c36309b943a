//! Agent activity service
//!
//! Wires the injected span and evaluation repositories to the aggregator:
//! loads `invoke_agent` spans for the period, bounds the evaluation lookup with
//! a timeout, and aggregates.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::aggregator::{AgentActivityAggregator, AggregationError, AggregatorOptions};
use super::attributes::keys;
use super::period::{AggregationPeriod, PeriodSelector};
use super::types::AgentActivityReport;
use crate::core::config::AgentsConfig;
use crate::core::constants::AGENT_SPAN_OPERATION;
use crate::data::error::DataError;
use crate::data::traits::{EvaluationRepository, SpanRepository, TimeoutEvaluations};
use crate::data::types::{AttributeFilter, SpanQuery};

/// Activity request failure
#[derive(Error, Debug)]
pub enum ActivityError {
    /// Span query failed before aggregation started
    #[error(transparent)]
    Spans(DataError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

/// Loads agent spans and aggregates them into an activity report
pub struct AgentActivityService {
    spans: Arc<dyn SpanRepository>,
    evaluations: Arc<dyn EvaluationRepository>,
    aggregator: AgentActivityAggregator,
    span_limit: usize,
    eval_timeout: Duration,
}

impl AgentActivityService {
    pub fn new(
        spans: Arc<dyn SpanRepository>,
        evaluations: Arc<dyn EvaluationRepository>,
        config: &AgentsConfig,
    ) -> Self {
        Self {
            spans,
            evaluations,
            aggregator: AgentActivityAggregator::new(AggregatorOptions {
                max_ids_per_agent: config.max_ids_per_agent,
                max_day_count: config.max_period_days,
            }),
            span_limit: config.span_limit,
            eval_timeout: Duration::from_secs(config.eval_timeout_secs),
        }
    }

    /// Resolve `selector` against `now` and aggregate that window
    pub async fn activity_for(
        &self,
        selector: PeriodSelector,
        now: DateTime<Utc>,
    ) -> Result<AgentActivityReport, ActivityError> {
        self.activity(&selector.resolve(now)).await
    }

    /// Aggregate agent activity over `period`
    pub async fn activity(
        &self,
        period: &AggregationPeriod,
    ) -> Result<AgentActivityReport, ActivityError> {
        self.aggregator.validate(period)?;

        let query = SpanQuery {
            filter: AttributeFilter::Equals(
                keys::OPERATION_NAME.to_string(),
                AGENT_SPAN_OPERATION.to_string(),
            ),
            from_timestamp: period.start,
            to_timestamp: period.end,
            limit: self.span_limit,
        };

        let spans = self
            .spans
            .query_spans(&query)
            .await
            .map_err(ActivityError::Spans)?;

        if spans.len() >= self.span_limit {
            tracing::warn!(
                limit = self.span_limit,
                start = %period.start,
                end = %period.end,
                "Span limit reached, agent activity may be incomplete"
            );
        }

        let evaluations = TimeoutEvaluations::new(self.evaluations.as_ref(), self.eval_timeout);
        let report = self
            .aggregator
            .aggregate(&spans, period, &evaluations)
            .await?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;
    use crate::data::memory::MemoryStore;
    use crate::data::types::{AttributeValue, EvaluationRecord, SpanRecord};

    fn agent_span(trace_id: &str, agent: &str, at: DateTime<Utc>) -> SpanRecord {
        let mut attributes = HashMap::new();
        attributes.insert(
            keys::OPERATION_NAME.to_string(),
            AttributeValue::from(AGENT_SPAN_OPERATION),
        );
        attributes.insert(keys::AGENT_NAME.to_string(), AttributeValue::from(agent));
        SpanRecord {
            trace_id: trace_id.to_string(),
            start_time_unix_nano: at.timestamp_nanos_opt().unwrap() as u64,
            attributes,
        }
    }

    fn service(store: Arc<MemoryStore>, config: &AgentsConfig) -> AgentActivityService {
        AgentActivityService::new(store.clone(), store, config)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 15, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_activity_filters_operation_and_joins_scores() {
        let store = Arc::new(MemoryStore::new(100, 100));
        let mut chat = agent_span("t9", "chatter", now() - chrono::Duration::hours(1));
        chat.attributes.insert(
            keys::OPERATION_NAME.to_string(),
            AttributeValue::from("chat"),
        );
        store.insert_spans(vec![
            agent_span("t1", "planner", now() - chrono::Duration::hours(2)),
            agent_span("t2", "planner", now() - chrono::Duration::days(2)),
            chat,
        ]);
        store.insert_evaluations(vec![EvaluationRecord {
            trace_id: Some("t1".to_string()),
            evaluation_name: "relevance".to_string(),
            score_value: Some(0.75),
        }]);

        let report = service(store, &AgentsConfig::default())
            .activity_for(PeriodSelector::Last7Days, now())
            .await
            .unwrap();

        assert_eq!(report.day_count, 7);
        assert_eq!(report.agents.len(), 1);
        let planner = &report.agents[0];
        assert_eq!(planner.agent_name, "planner");
        assert_eq!(planner.invocations, 2);
        assert_eq!(planner.eval_summary["relevance"].avg, 0.75);
        assert_eq!(planner.daily_counts.iter().sum::<u64>(), 2);
    }

    #[tokio::test]
    async fn test_activity_respects_span_limit() {
        let store = Arc::new(MemoryStore::new(100, 100));
        store.insert_spans(
            (0..5)
                .map(|i| agent_span(&format!("t{i}"), "planner", now() - chrono::Duration::hours(1)))
                .collect(),
        );
        let config = AgentsConfig {
            span_limit: 3,
            ..AgentsConfig::default()
        };

        let report = service(store, &config)
            .activity_for(PeriodSelector::Last24Hours, now())
            .await
            .unwrap();
        assert_eq!(report.agents[0].invocations, 3);
    }

    #[tokio::test]
    async fn test_activity_rejects_window_above_max() {
        let store = Arc::new(MemoryStore::new(100, 100));
        let config = AgentsConfig {
            max_period_days: 30,
            ..AgentsConfig::default()
        };
        let period = AggregationPeriod::between(now() - chrono::Duration::days(45), now());

        let err = service(store, &config).activity(&period).await.unwrap_err();
        assert!(matches!(
            err,
            ActivityError::Aggregation(AggregationError::InvalidDayCount { .. })
        ));
    }

    #[derive(Default)]
    struct CountingSpans {
        queries: AtomicUsize,
    }

    #[async_trait]
    impl SpanRepository for CountingSpans {
        async fn query_spans(&self, _query: &SpanQuery) -> Result<Vec<SpanRecord>, DataError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_invalid_day_count_skips_span_query() {
        let spans = Arc::new(CountingSpans::default());
        let store = Arc::new(MemoryStore::new(100, 100));
        let service =
            AgentActivityService::new(spans.clone(), store, &AgentsConfig::default());

        for day_count in [0, -1, 91] {
            let period = AggregationPeriod::new(now(), now(), day_count);
            let err = service.activity(&period).await.unwrap_err();
            assert!(matches!(
                err,
                ActivityError::Aggregation(AggregationError::InvalidDayCount { .. })
            ));
        }
        assert_eq!(spans.queries.load(Ordering::SeqCst), 0);

        service
            .activity_for(PeriodSelector::Last7Days, now())
            .await
            .unwrap();
        assert_eq!(spans.queries.load(Ordering::SeqCst), 1);
    }
}
