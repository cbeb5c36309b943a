//! Agent activity aggregation.
//!
//! Runs in three phases over a single invocation:
//!
//! 1. **Span aggregation** - one pass over the spans builds per-agent counters,
//!    distinct session/trace sets, source-type counts, the day histogram and a
//!    reverse index from trace ID to the agents seen in that trace.
//! 2. **Evaluation join** - the distinct trace IDs from phase 1 are sent to the
//!    evaluation repository in one batch; every finite score is attributed to
//!    each agent of its trace.
//! 3. **Summarize** - per-agent summaries, sorted by invocations descending.
//!
//! The aggregator holds only its options. All intermediate state lives on the
//! stack of a single `aggregate` call.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use super::attributes;
use super::period::AggregationPeriod;
use super::types::{AgentActivityReport, AgentSummary, EvalStats};
use crate::core::constants::{DEFAULT_MAX_IDS_PER_AGENT, DEFAULT_MAX_PERIOD_DAYS};
use crate::data::error::DataError;
use crate::data::traits::EvaluationRepository;
use crate::data::types::{EvaluationRecord, SpanRecord};
use crate::utils::time::nanos_to_datetime;

/// Aggregation failure
#[derive(Error, Debug)]
pub enum AggregationError {
    /// Day count outside `1..=max`
    #[error("Invalid day count {day_count}: must be between 1 and {max}")]
    InvalidDayCount { day_count: i64, max: i64 },

    /// Evaluation repository failure, passed through untouched
    #[error(transparent)]
    Evaluations(#[from] DataError),
}

/// Limits applied by the aggregator
#[derive(Debug, Clone, Copy)]
pub struct AggregatorOptions {
    /// Cap on sampled session and trace IDs per agent
    pub max_ids_per_agent: usize,
    /// Largest accepted `day_count`
    pub max_day_count: i64,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            max_ids_per_agent: DEFAULT_MAX_IDS_PER_AGENT,
            max_day_count: DEFAULT_MAX_PERIOD_DAYS,
        }
    }
}

/// Builds per-agent activity summaries from spans and evaluation scores
#[derive(Debug, Clone, Default)]
pub struct AgentActivityAggregator {
    options: AggregatorOptions,
}

impl AgentActivityAggregator {
    pub fn new(options: AggregatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &AggregatorOptions {
        &self.options
    }

    /// Aggregate `spans` over `period`, joining scores from `evaluations`.
    ///
    /// `evaluations` is called at most once, and not at all when the spans
    /// carry no trace IDs. Any repository error aborts the aggregation.
    pub async fn aggregate<E>(
        &self,
        spans: &[SpanRecord],
        period: &AggregationPeriod,
        evaluations: &E,
    ) -> Result<AgentActivityReport, AggregationError>
    where
        E: EvaluationRepository + ?Sized,
    {
        self.validate(period)?;

        let mut state = SpanAggregation::collect(spans, period, self.options.max_ids_per_agent);

        if !state.trace_order.is_empty() {
            let records = evaluations
                .load_evaluations_by_trace_ids(&state.trace_order, period.start, period.end)
                .await?;
            state.join_evaluations(&records);
        }

        let agents = state.summarize();

        tracing::debug!(
            spans = spans.len(),
            agents = agents.len(),
            day_count = period.day_count,
            "Agent activity aggregated"
        );

        Ok(AgentActivityReport {
            start_date: period.start,
            end_date: period.end,
            day_count: period.day_count,
            agents,
        })
    }

    /// Reject day counts outside `1..=max_day_count`
    pub(crate) fn validate(&self, period: &AggregationPeriod) -> Result<(), AggregationError> {
        if period.day_count < 1 || period.day_count > self.options.max_day_count {
            return Err(AggregationError::InvalidDayCount {
                day_count: period.day_count,
                max: self.options.max_day_count,
            });
        }
        Ok(())
    }
}

// ============================================================================
// PHASE STATE
// ============================================================================

/// Distinct values with the first `cap` kept in insertion order
#[derive(Debug)]
struct DistinctSample {
    seen: FxHashSet<String>,
    sample: Vec<String>,
    cap: usize,
}

impl DistinctSample {
    fn new(cap: usize) -> Self {
        Self {
            seen: FxHashSet::default(),
            sample: Vec::new(),
            cap,
        }
    }

    fn insert(&mut self, value: &str) {
        if self.seen.contains(value) {
            return;
        }
        self.seen.insert(value.to_string());
        if self.sample.len() < self.cap {
            self.sample.push(value.to_string());
        }
    }

    fn total(&self) -> usize {
        self.seen.len()
    }

    fn truncated(&self) -> bool {
        self.seen.len() > self.sample.len()
    }
}

#[derive(Debug)]
struct AgentAccumulator {
    name: String,
    invocations: u64,
    errors: u64,
    rate_limits: u64,
    output_size_sum: f64,
    sessions: DistinctSample,
    traces: DistinctSample,
    source_types: BTreeMap<String, u64>,
    daily_counts: Vec<u64>,
    scores: BTreeMap<String, Vec<f64>>,
}

impl AgentAccumulator {
    fn new(name: String, day_count: usize, max_ids: usize) -> Self {
        Self {
            name,
            invocations: 0,
            errors: 0,
            rate_limits: 0,
            output_size_sum: 0.0,
            sessions: DistinctSample::new(max_ids),
            traces: DistinctSample::new(max_ids),
            source_types: BTreeMap::new(),
            daily_counts: vec![0; day_count],
            scores: BTreeMap::new(),
        }
    }

    fn into_summary(self) -> AgentSummary {
        let error_rate = if self.invocations == 0 {
            0.0
        } else {
            self.errors as f64 / self.invocations as f64
        };
        let avg_output_size = if self.invocations == 0 {
            0
        } else {
            (self.output_size_sum / self.invocations as f64).round() as i64
        };

        let eval_summary = self
            .scores
            .into_iter()
            .filter_map(|(metric, scores)| eval_stats(scores).map(|stats| (metric, stats)))
            .collect();

        AgentSummary {
            agent_name: self.name,
            invocations: self.invocations,
            errors: self.errors,
            error_rate,
            rate_limit_count: self.rate_limits,
            avg_output_size,
            session_count: self.sessions.total(),
            session_ids_truncated: self.sessions.truncated(),
            session_ids: self.sessions.sample,
            trace_ids_total: self.traces.total(),
            trace_ids_truncated: self.traces.truncated(),
            trace_ids: self.traces.sample,
            source_types: self.source_types,
            daily_counts: self.daily_counts,
            eval_summary,
        }
    }
}

/// Intermediate state shared by the three phases
#[derive(Debug)]
struct SpanAggregation {
    /// Agents in first-encounter order
    agents: Vec<AgentAccumulator>,
    agent_index: FxHashMap<String, usize>,
    /// Trace ID -> indices of agents seen in that trace
    trace_agents: FxHashMap<String, Vec<usize>>,
    /// Distinct trace IDs in first-encounter order
    trace_order: Vec<String>,
}

impl SpanAggregation {
    fn collect(spans: &[SpanRecord], period: &AggregationPeriod, max_ids: usize) -> Self {
        let day_count = usize::try_from(period.day_count).unwrap_or(0);
        let mut state = Self {
            agents: Vec::new(),
            agent_index: FxHashMap::default(),
            trace_agents: FxHashMap::default(),
            trace_order: Vec::new(),
        };

        for span in spans {
            let name = attributes::agent_name(span);
            let idx = match state.agent_index.get(&name) {
                Some(&idx) => idx,
                None => {
                    let idx = state.agents.len();
                    state.agent_index.insert(name.clone(), idx);
                    state
                        .agents
                        .push(AgentAccumulator::new(name, day_count, max_ids));
                    idx
                }
            };

            let agent = &mut state.agents[idx];
            agent.invocations += 1;
            if attributes::has_error(span) {
                agent.errors += 1;
            }
            if attributes::has_rate_limit(span) {
                agent.rate_limits += 1;
            }
            agent.output_size_sum += attributes::output_size(span);
            if let Some(session_id) = attributes::session_id(span) {
                agent.sessions.insert(&session_id);
            }
            *agent
                .source_types
                .entry(attributes::source_type(span).to_string())
                .or_insert(0) += 1;
            if let Some(day) = period.day_index(nanos_to_datetime(span.start_time_unix_nano)) {
                agent.daily_counts[day] += 1;
            }

            if !span.trace_id.is_empty() {
                agent.traces.insert(&span.trace_id);
                state.link_trace(&span.trace_id, idx);
            }
        }

        state
    }

    fn link_trace(&mut self, trace_id: &str, agent_idx: usize) {
        match self.trace_agents.get_mut(trace_id) {
            Some(agents) => {
                if !agents.contains(&agent_idx) {
                    agents.push(agent_idx);
                }
            }
            None => {
                self.trace_agents
                    .insert(trace_id.to_string(), vec![agent_idx]);
                self.trace_order.push(trace_id.to_string());
            }
        }
    }

    fn join_evaluations(&mut self, records: &[EvaluationRecord]) {
        let mut unmatched = 0usize;
        for record in records {
            let (Some(trace_id), Some(score)) = (record.trace_id.as_deref(), record.finite_score())
            else {
                continue;
            };
            let Some(agent_idxs) = self.trace_agents.get(trace_id) else {
                unmatched += 1;
                continue;
            };
            for &idx in agent_idxs {
                self.agents[idx]
                    .scores
                    .entry(record.evaluation_name.clone())
                    .or_default()
                    .push(score);
            }
        }
        if unmatched > 0 {
            tracing::trace!(unmatched, "Discarded evaluations for unseen traces");
        }
    }

    fn summarize(self) -> Vec<AgentSummary> {
        let mut summaries: Vec<AgentSummary> = self
            .agents
            .into_iter()
            .map(AgentAccumulator::into_summary)
            .collect();
        // Stable: ties keep first-encounter order
        summaries.sort_by_key(|s| Reverse(s.invocations));
        summaries
    }
}

fn eval_stats(mut scores: Vec<f64>) -> Option<EvalStats> {
    if scores.is_empty() {
        return None;
    }
    scores.sort_by(f64::total_cmp);
    let count = scores.len();
    let avg = scores.iter().sum::<f64>() / count as f64;
    Some(EvalStats {
        avg: round3(avg),
        min: round3(scores[0]),
        max: round3(scores[count - 1]),
        count,
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
#[path = "aggregator_tests.rs"]
mod tests;
