//! Queue health derived from recorded drop signals

use serde::Serialize;
use std::collections::HashMap;

use crate::constants::queue_health::{CRITICAL_DROP_RATIO, DEGRADED_DROP_RATIO};

/// Health classification from the share of work dropped under backpressure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueueHealth {
    /// Under 1% of observed work dropped
    Healthy,
    /// 1-5% dropped
    Degraded { drop_percent: f64 },
    /// 5% or more dropped
    Critical { drop_percent: f64 },
}

impl QueueHealth {
    /// Classify from a drop ratio in 0.0-1.0
    pub fn from_drop_ratio(ratio: f64) -> Self {
        if ratio >= CRITICAL_DROP_RATIO {
            Self::Critical {
                drop_percent: ratio * 100.0,
            }
        } else if ratio >= DEGRADED_DROP_RATIO {
            Self::Degraded {
                drop_percent: ratio * 100.0,
            }
        } else {
            Self::Healthy
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// Backpressure view for dashboards
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueHealthStatus {
    pub dropped_tasks: u64,
    pub dropped_results: u64,
    pub drop_reasons: HashMap<String, u64>,
    pub health: QueueHealth,
}

impl QueueHealthStatus {
    pub(crate) fn new(
        completed_builds: u64,
        dropped_tasks: u64,
        dropped_results: u64,
        drop_reasons: HashMap<String, u64>,
    ) -> Self {
        let dropped = dropped_tasks + dropped_results;
        let observed = completed_builds + dropped;
        let ratio = if observed == 0 {
            0.0
        } else {
            dropped as f64 / observed as f64
        };

        Self {
            dropped_tasks,
            dropped_results,
            drop_reasons,
            health: QueueHealth::from_drop_ratio(ratio),
        }
    }

    pub fn total_dropped(&self) -> u64 {
        self.dropped_tasks + self.dropped_results
    }
}
