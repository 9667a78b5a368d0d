//! # OpenTelemetry Instruments
//!
//! Mirrors of the in-process build metrics, exported through whatever meter
//! provider the host installs. Without a provider every call is a no-op.
//!
//! Instruments are created on first use, so the host should install its
//! provider before the pipeline records anything.
//!
//! Labels:
//! - `component`: component label of the build or dropped work
//! - `outcome`: success, failure
//! - `kind`: task, result (dropped work only)
//! - `reason`: drop reason label

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use std::sync::OnceLock;

static BUILD_METER: OnceLock<Meter> = OnceLock::new();

static BUILDS_TOTAL: OnceLock<Counter<u64>> = OnceLock::new();
static CACHE_HITS: OnceLock<Counter<u64>> = OnceLock::new();
static BUILD_DURATION: OnceLock<Histogram<f64>> = OnceLock::new();
static DROPPED_WORK: OnceLock<Counter<u64>> = OnceLock::new();
static CALLBACK_FAILURES: OnceLock<Counter<u64>> = OnceLock::new();
static INVALID_RESULTS: OnceLock<Counter<u64>> = OnceLock::new();

fn meter() -> &'static Meter {
    BUILD_METER.get_or_init(|| opentelemetry::global::meter("buildline"))
}

/// Total builds recorded, labelled by component and outcome
pub fn builds_total() -> &'static Counter<u64> {
    BUILDS_TOTAL.get_or_init(|| {
        meter()
            .u64_counter("buildline.builds.total")
            .with_description("Total number of completed builds")
            .build()
    })
}

pub fn cache_hits() -> &'static Counter<u64> {
    CACHE_HITS.get_or_init(|| {
        meter()
            .u64_counter("buildline.builds.cache_hits")
            .with_description("Builds served from the output cache")
            .build()
    })
}

/// Build duration in milliseconds
pub fn build_duration() -> &'static Histogram<f64> {
    BUILD_DURATION.get_or_init(|| {
        meter()
            .f64_histogram("buildline.builds.duration")
            .with_description("Build duration in milliseconds")
            .with_unit("ms")
            .build()
    })
}

/// Work discarded by producers because a queue was full or closed
pub fn dropped_work() -> &'static Counter<u64> {
    DROPPED_WORK.get_or_init(|| {
        meter()
            .u64_counter("buildline.queue.dropped")
            .with_description("Tasks and results dropped under backpressure")
            .build()
    })
}

pub fn callback_failures() -> &'static Counter<u64> {
    CALLBACK_FAILURES.get_or_init(|| {
        meter()
            .u64_counter("buildline.callbacks.failures")
            .with_description("Result callbacks that panicked")
            .build()
    })
}

pub fn invalid_results() -> &'static Counter<u64> {
    INVALID_RESULTS.get_or_init(|| {
        meter()
            .u64_counter("buildline.results.invalid")
            .with_description("Result stream items that were not build results")
            .build()
    })
}

pub(crate) fn record_build(component: &str, success: bool, cache_hit: bool, duration_ms: f64) {
    let outcome = if success { "success" } else { "failure" };
    let labels = [
        KeyValue::new("component", component.to_string()),
        KeyValue::new("outcome", outcome),
    ];
    builds_total().add(1, &labels);
    build_duration().record(duration_ms, &labels);
    if cache_hit {
        cache_hits().add(1, &[KeyValue::new("component", component.to_string())]);
    }
}

pub(crate) fn record_drop(kind: &'static str, component: &str, reason: &str) {
    dropped_work().add(
        1,
        &[
            KeyValue::new("kind", kind),
            KeyValue::new("component", component.to_string()),
            KeyValue::new("reason", reason.to_string()),
        ],
    );
}
