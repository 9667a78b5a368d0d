//! # Build Metrics
//!
//! Aggregate counters for build outcomes, durations, cache hits and dropped
//! work. All fields sit behind one lock so a snapshot never observes a
//! half-applied update.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use super::queue_health::QueueHealthStatus;
use super::telemetry;
use crate::processing::BuildResult;

#[derive(Debug, Default)]
struct MetricsState {
    total_builds: u64,
    successful_builds: u64,
    failed_builds: u64,
    cache_hits: u64,
    total_duration: Duration,
    average_duration: Duration,
    dropped_tasks: u64,
    dropped_results: u64,
    drop_reasons: HashMap<String, u64>,
    invalid_results: u64,
    callback_failures: u64,
}

/// Independent copy of all counters at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub collected_at: DateTime<Utc>,
    pub total_builds: u64,
    pub successful_builds: u64,
    pub failed_builds: u64,
    pub cache_hits: u64,
    pub total_duration: Duration,
    pub average_duration: Duration,
    pub dropped_tasks: u64,
    pub dropped_results: u64,
    pub drop_reasons: HashMap<String, u64>,
    pub invalid_results: u64,
    pub callback_failures: u64,
}

impl MetricsSnapshot {
    pub fn cache_hit_rate(&self) -> f64 {
        percentage(self.cache_hits, self.total_builds)
    }

    pub fn success_rate(&self) -> f64 {
        percentage(self.successful_builds, self.total_builds)
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Process-wide build metrics, shared by the scheduler and the result processor
#[derive(Debug, Default)]
pub struct BuildMetrics {
    state: RwLock<MetricsState>,
}

impl BuildMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed build
    pub fn record_build(&self, result: &BuildResult) {
        {
            let mut state = self.state.write();
            state.total_builds += 1;
            state.total_duration += result.duration;
            if result.cache_hit {
                state.cache_hits += 1;
            }
            if result.error.is_some() {
                state.failed_builds += 1;
            } else {
                state.successful_builds += 1;
            }
            let average_nanos = state.total_duration.as_nanos() / u128::from(state.total_builds);
            state.average_duration =
                Duration::from_nanos(u64::try_from(average_nanos).unwrap_or(u64::MAX));
        }

        telemetry::record_build(
            &result.component,
            result.is_success(),
            result.cache_hit,
            result.duration.as_secs_f64() * 1000.0,
        );
    }

    /// Record a task the scheduler discarded instead of queueing.
    ///
    /// `component` is accepted for future per-source breakdown; counters are
    /// not partitioned by it.
    pub fn record_dropped_task(&self, component: &str, reason: &str) {
        let dropped = {
            let mut state = self.state.write();
            state.dropped_tasks += 1;
            *state.drop_reasons.entry(reason.to_string()).or_insert(0) += 1;
            state.dropped_tasks
        };
        warn!(
            component = %component,
            reason = %reason,
            dropped_tasks = dropped,
            "Build task dropped (backpressure)"
        );
        telemetry::record_drop("task", component, reason);
    }

    /// Record a build result that could not be delivered to the processor
    pub fn record_dropped_result(&self, component: &str, reason: &str) {
        let dropped = {
            let mut state = self.state.write();
            state.dropped_results += 1;
            *state.drop_reasons.entry(reason.to_string()).or_insert(0) += 1;
            state.dropped_results
        };
        warn!(
            component = %component,
            reason = %reason,
            dropped_results = dropped,
            "Build result dropped (backpressure)"
        );
        telemetry::record_drop("result", component, reason);
    }

    /// Record a result stream item that was not a build result
    pub fn record_invalid_result(&self) {
        self.state.write().invalid_results += 1;
        telemetry::invalid_results().add(1, &[]);
    }

    pub fn record_callback_failure(&self) {
        self.state.write().callback_failures += 1;
        telemetry::callback_failures().add(1, &[]);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.read();
        MetricsSnapshot {
            collected_at: Utc::now(),
            total_builds: state.total_builds,
            successful_builds: state.successful_builds,
            failed_builds: state.failed_builds,
            cache_hits: state.cache_hits,
            total_duration: state.total_duration,
            average_duration: state.average_duration,
            dropped_tasks: state.dropped_tasks,
            dropped_results: state.dropped_results,
            drop_reasons: state.drop_reasons.clone(),
            invalid_results: state.invalid_results,
            callback_failures: state.callback_failures,
        }
    }

    /// Return every counter to zero and forget all drop reasons
    pub fn reset(&self) {
        *self.state.write() = MetricsState::default();
        debug!("Build metrics reset");
    }

    /// Percentage of builds served from cache, 0.0 before the first build
    pub fn cache_hit_rate(&self) -> f64 {
        let state = self.state.read();
        percentage(state.cache_hits, state.total_builds)
    }

    /// Percentage of builds without an error, 0.0 before the first build
    pub fn success_rate(&self) -> f64 {
        let state = self.state.read();
        percentage(state.successful_builds, state.total_builds)
    }

    pub fn average_duration(&self) -> Duration {
        self.state.read().average_duration
    }

    pub fn queue_health_status(&self) -> QueueHealthStatus {
        let state = self.state.read();
        QueueHealthStatus::new(
            state.total_builds,
            state.dropped_tasks,
            state.dropped_results,
            state.drop_reasons.clone(),
        )
    }
}
