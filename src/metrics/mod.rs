//! # Build Metrics and Backpressure Observability
//!
//! - [`BuildMetrics`]: outcome counters, durations, cache hits, drop signals
//! - [`QueueHealthStatus`]: dropped work by reason with a health classification
//! - [`telemetry`]: OpenTelemetry mirrors of the same counters
//!
//! This layer records backpressure; it never enforces it. Producers that
//! discard work report it through `record_dropped_task` and
//! `record_dropped_result`.

mod build_metrics;
mod queue_health;
pub mod telemetry;

pub use build_metrics::{BuildMetrics, MetricsSnapshot};
pub use queue_health::{QueueHealth, QueueHealthStatus};
