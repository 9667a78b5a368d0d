//! # Structured Logging Module
//!
//! Environment-aware structured logging for the build pipeline. Console output
//! is human readable by default; `BUILDLINE_LOG_FORMAT=json` switches to JSON
//! lines for log shippers. `RUST_LOG` takes precedence over the environment
//! derived level.

use std::sync::OnceLock;

use chrono::Utc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::loader::detect_environment;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = detect_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(log_level_for(&environment)));
        let json = std::env::var("BUILDLINE_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let console = if json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // A host application may already own the global subscriber
        if tracing_subscriber::registry().with(console).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Log level based on environment
fn log_level_for(environment: &str) -> &'static str {
    match environment {
        "test" | "development" => "debug",
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for cache operations
pub fn log_cache_operation(
    operation: &str,
    key: Option<&str>,
    entries: usize,
    current_size: usize,
    details: Option<&str>,
) {
    tracing::debug!(
        operation = %operation,
        key = key,
        entries = entries,
        current_size = current_size,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "CACHE_OPERATION"
    );
}

/// Log structured data for pool operations
pub fn log_pool_operation(pool: &str, operation: &str, retained_capacity: usize, limit: usize) {
    tracing::debug!(
        pool = %pool,
        operation = %operation,
        retained_capacity = retained_capacity,
        limit = limit,
        timestamp = %Utc::now().to_rfc3339(),
        "POOL_OPERATION"
    );
}

/// Log structured data for result processor lifecycle changes
pub fn log_processor_operation(
    processor_id: &str,
    operation: &str,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        processor_id = %processor_id,
        operation = %operation,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "PROCESSOR_OPERATION"
    );
}
