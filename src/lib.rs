#![allow(clippy::doc_markdown)] // Allow technical terms like OpenTelemetry, LRU in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Buildline Core
//!
//! Runtime support for a component build server: an in-memory output cache,
//! pooled build resources, build metrics and an asynchronous result processor.
//!
//! ## Overview
//!
//! A scheduler compiles UI components on demand. Before compiling it checks
//! the [`BuildCache`]; while compiling it borrows buffers, lists and
//! execution contexts from [`ResourcePools`]; when a build finishes the
//! executor publishes a [`BuildResult`] to the [`ResultProcessor`], which
//! records it into [`BuildMetrics`] and notifies registered callbacks (dev
//! server reload, diagnostics, dashboards).
//!
//! ## Module Organization
//!
//! - [`cache`] - byte-bounded LRU cache with TTL expiry
//! - [`pool`] - bounded object pools with reset-on-release
//! - [`metrics`] - build counters, backpressure signals, OpenTelemetry mirrors
//! - [`processing`] - result stream consumer and callback fan-out
//! - [`pipeline`] - bootstrap of all of the above from one configuration
//! - [`config`] - environment presets, TOML files and `BUILDLINE_` overrides
//! - [`logging`] - structured `tracing` setup
//! - [`error`] - lifecycle and configuration errors
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use buildline_core::config::ConfigLoader;
//! use buildline_core::pipeline::BuildPipeline;
//!
//! # async fn example() -> buildline_core::BuildlineResult<()> {
//! buildline_core::logging::init_structured_logging();
//!
//! let config = ConfigLoader::new().load()?;
//! let pipeline: BuildPipeline<String> = BuildPipeline::bootstrap(config)?;
//!
//! if pipeline.cache().get("button").is_none() {
//!     // compile, then pipeline.cache().set("button", output)
//! }
//!
//! pipeline.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! cargo bench --features benchmarks
//! ```

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod pool;
pub mod processing;

pub use cache::{BuildCache, CacheStats};
pub use config::{BuildlineConfig, ConfigLoader};
pub use error::{BuildlineError, BuildlineResult};
pub use metrics::{BuildMetrics, MetricsSnapshot, QueueHealth, QueueHealthStatus};
pub use pipeline::{BuildPipeline, PublishError, ResultPublisher};
pub use pool::{Pool, PoolStats, Recyclable, ResourcePools};
pub use processing::{
    BuildFailure, BuildResult, CallbackHandle, ErrorParser, ParsedError, ProcessorError,
    ProcessorState, ResultEnvelope, ResultProcessor,
};
