//! In-memory span and evaluation store
//!
//! Backs both repository traits with bounded ring buffers. Records are kept in
//! arrival order; once a buffer reaches its cap the oldest records are dropped.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::error::DataError;
use super::traits::{EvaluationRepository, SpanRepository};
use super::types::{EvaluationRecord, SpanQuery, SpanRecord};
use crate::utils::time::nanos_to_datetime;

/// Fixture file layout: `{ "spans": [...], "evaluations": [...] }`
#[derive(Debug, Default, Deserialize)]
struct Fixture {
    #[serde(default)]
    spans: Vec<SpanRecord>,
    #[serde(default)]
    evaluations: Vec<EvaluationRecord>,
}

/// Bounded in-memory store for spans and evaluations
pub struct MemoryStore {
    spans: RwLock<VecDeque<SpanRecord>>,
    evaluations: RwLock<VecDeque<EvaluationRecord>>,
    max_spans: usize,
    max_evaluations: usize,
}

impl MemoryStore {
    pub fn new(max_spans: usize, max_evaluations: usize) -> Self {
        Self {
            spans: RwLock::new(VecDeque::new()),
            evaluations: RwLock::new(VecDeque::new()),
            max_spans,
            max_evaluations,
        }
    }

    /// Load spans and evaluations from a JSON fixture file.
    ///
    /// Returns the number of spans and evaluations accepted.
    pub fn load_fixture(&self, path: &Path) -> Result<(usize, usize), DataError> {
        tracing::debug!(path = %path.display(), "Loading store fixture");
        let content = fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&content)?;
        let spans = self.insert_spans(fixture.spans);
        let evaluations = self.insert_evaluations(fixture.evaluations);
        Ok((spans, evaluations))
    }

    /// Append spans, evicting the oldest beyond `max_spans`
    pub fn insert_spans(&self, spans: Vec<SpanRecord>) -> usize {
        let accepted = spans.len();
        let mut guard = self.spans.write();
        guard.extend(spans);
        let evicted = evict_oldest(&mut guard, self.max_spans);
        if evicted > 0 {
            tracing::debug!(evicted, max = self.max_spans, "Span retention limit reached");
        }
        accepted
    }

    /// Append evaluations, evicting the oldest beyond `max_evaluations`
    pub fn insert_evaluations(&self, evaluations: Vec<EvaluationRecord>) -> usize {
        let accepted = evaluations.len();
        let mut guard = self.evaluations.write();
        guard.extend(evaluations);
        let evicted = evict_oldest(&mut guard, self.max_evaluations);
        if evicted > 0 {
            tracing::debug!(
                evicted,
                max = self.max_evaluations,
                "Evaluation retention limit reached"
            );
        }
        accepted
    }

    pub fn span_count(&self) -> usize {
        self.spans.read().len()
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluations.read().len()
    }

    /// Periodically log store occupancy until shutdown is signalled
    pub fn start_stats_task(
        self: &Arc<Self>,
        period: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick fires immediately
            interval.tick().await;
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::debug!("Store stats task shutting down");
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        tracing::debug!(
                            spans = store.span_count(),
                            max_spans = store.max_spans,
                            evaluations = store.evaluation_count(),
                            max_evaluations = store.max_evaluations,
                            "Store occupancy"
                        );
                    }
                }
            }
        })
    }
}

fn evict_oldest<T>(buffer: &mut VecDeque<T>, cap: usize) -> usize {
    let excess = buffer.len().saturating_sub(cap);
    buffer.drain(..excess);
    excess
}

fn in_range(span: &SpanRecord, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
    let start = nanos_to_datetime(span.start_time_unix_nano);
    start >= from && start <= to
}

#[async_trait]
impl SpanRepository for MemoryStore {
    async fn query_spans(&self, query: &SpanQuery) -> Result<Vec<SpanRecord>, DataError> {
        let spans = self.spans.read();
        // Newest `limit` matches, returned in arrival order
        let mut result: Vec<SpanRecord> = spans
            .iter()
            .rev()
            .filter(|s| in_range(s, query.from_timestamp, query.to_timestamp))
            .filter(|s| query.filter.matches(s))
            .take(query.limit)
            .cloned()
            .collect();
        result.reverse();
        tracing::trace!(
            matched = result.len(),
            limit = query.limit,
            "Memory span query"
        );
        Ok(result)
    }
}

#[async_trait]
impl EvaluationRepository for MemoryStore {
    async fn load_evaluations_by_trace_ids(
        &self,
        trace_ids: &[String],
        from_timestamp: DateTime<Utc>,
        to_timestamp: DateTime<Utc>,
    ) -> Result<Vec<EvaluationRecord>, DataError> {
        if trace_ids.is_empty() {
            return Ok(Vec::new());
        }
        let requested: FxHashSet<&str> = trace_ids.iter().map(String::as_str).collect();

        // Evaluations carry no timestamp; a trace is in range when any of its spans is.
        let in_window: FxHashSet<String> = self
            .spans
            .read()
            .iter()
            .filter(|s| requested.contains(s.trace_id.as_str()))
            .filter(|s| in_range(s, from_timestamp, to_timestamp))
            .map(|s| s.trace_id.clone())
            .collect();

        let evaluations = self.evaluations.read();
        Ok(evaluations
            .iter()
            .filter(|e| {
                e.trace_id
                    .as_deref()
                    .is_some_and(|id| in_window.contains(id))
            })
            .cloned()
            .collect())
    }
}
