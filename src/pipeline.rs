//! # Build Pipeline
//!
//! Wires the cache, resource pools, metrics and result processor from one
//! [`BuildlineConfig`] and hands producers a non-blocking [`ResultPublisher`].
//!
//! ```rust,no_run
//! use buildline_core::config::BuildlineConfig;
//! use buildline_core::pipeline::BuildPipeline;
//! use buildline_core::processing::BuildResult;
//! use std::time::Duration;
//!
//! # async fn example() -> buildline_core::BuildlineResult<()> {
//! let pipeline: BuildPipeline<String> = BuildPipeline::bootstrap(BuildlineConfig::for_development())?;
//! pipeline.processor().add_callback(|result| println!("built {}", result.component));
//!
//! pipeline
//!     .publisher()
//!     .publish(BuildResult::success("header", Duration::from_millis(14)))?;
//!
//! pipeline.shutdown().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use crate::cache::BuildCache;
use crate::config::BuildlineConfig;
use crate::constants::{drop_reasons, UNKNOWN_COMPONENT};
use crate::error::BuildlineResult;
use crate::metrics::BuildMetrics;
use crate::pool::ResourcePools;
use crate::processing::{BuildResult, ErrorParser, ResultEnvelope, ResultProcessor};

/// Error types for result publishing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Result queue is full, dropped result for {component}")]
    QueueFull { component: String },
    #[error("Result processor is no longer accepting results")]
    Closed,
}

/// Cloneable producer handle for the result stream.
///
/// `publish` never waits. A full or closed stream is recorded as a dropped
/// result and reported to the caller, who decides whether to retry.
#[derive(Debug, Clone)]
pub struct ResultPublisher {
    sender: mpsc::Sender<ResultEnvelope>,
    metrics: Arc<BuildMetrics>,
}

impl ResultPublisher {
    pub fn publish(&self, result: BuildResult) -> Result<(), PublishError> {
        let component = if result.component.is_empty() {
            UNKNOWN_COMPONENT.to_string()
        } else {
            result.component.clone()
        };
        self.send(ResultEnvelope::Build(result), component)
    }

    /// Forward a stream item that could not be decoded as a build result
    pub fn publish_unrecognized(&self, description: impl Into<String>) -> Result<(), PublishError> {
        self.send(
            ResultEnvelope::Unrecognized {
                description: description.into(),
            },
            UNKNOWN_COMPONENT.to_string(),
        )
    }

    /// Remaining slots in the result channel
    pub fn capacity(&self) -> usize {
        self.sender.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn send(&self, envelope: ResultEnvelope, component: String) -> Result<(), PublishError> {
        match self.sender.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics
                    .record_dropped_result(&component, drop_reasons::RESULT_QUEUE_FULL);
                Err(PublishError::QueueFull { component })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.metrics
                    .record_dropped_result(&component, drop_reasons::PROCESSOR_STOPPED);
                Err(PublishError::Closed)
            }
        }
    }
}

/// All runtime components of one build server instance
pub struct BuildPipeline<C: Send + 'static> {
    config: BuildlineConfig,
    cache: Arc<BuildCache>,
    pools: Arc<ResourcePools<C>>,
    metrics: Arc<BuildMetrics>,
    processor: Arc<ResultProcessor>,
    publisher: ResultPublisher,
}

impl<C: Send + 'static> std::fmt::Debug for BuildPipeline<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildPipeline")
            .field("cache", &self.cache)
            .field("processor", &self.processor)
            .finish()
    }
}

impl<C: Send + 'static> BuildPipeline<C> {
    /// Validate `config`, build every component and start result processing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bootstrap(config: BuildlineConfig) -> BuildlineResult<Self> {
        Self::bootstrap_with_error_parser(config, None)
    }

    pub fn bootstrap_with_error_parser(
        config: BuildlineConfig,
        error_parser: Option<Arc<dyn ErrorParser>>,
    ) -> BuildlineResult<Self> {
        config.validate()?;
        config.log_configuration();

        let cache = Arc::new(BuildCache::from_config(&config.cache));
        let pools = Arc::new(ResourcePools::new(&config.pools));
        let metrics = Arc::new(BuildMetrics::new());

        let mut processor = ResultProcessor::new(metrics.clone());
        if let Some(parser) = error_parser {
            processor = processor.with_error_parser(parser);
        }

        let (sender, receiver) = mpsc::channel(config.processor.result_channel_capacity);
        processor.start_processing(receiver)?;

        info!(
            processor_id = %processor.id(),
            result_channel_capacity = config.processor.result_channel_capacity,
            "Build pipeline started"
        );

        Ok(Self {
            config,
            cache,
            pools,
            publisher: ResultPublisher {
                sender,
                metrics: metrics.clone(),
            },
            metrics,
            processor: Arc::new(processor),
        })
    }

    pub fn config(&self) -> &BuildlineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<BuildCache> {
        &self.cache
    }

    pub fn pools(&self) -> &Arc<ResourcePools<C>> {
        &self.pools
    }

    pub fn metrics(&self) -> &Arc<BuildMetrics> {
        &self.metrics
    }

    pub fn processor(&self) -> &Arc<ResultProcessor> {
        &self.processor
    }

    pub fn publisher(&self) -> ResultPublisher {
        self.publisher.clone()
    }

    /// Stop result processing. Safe to call more than once.
    pub async fn shutdown(&self) {
        self.processor.stop().await;
        info!(processor_id = %self.processor.id(), "Build pipeline stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_after_shutdown_records_processor_stopped() {
        let pipeline: BuildPipeline<String> =
            BuildPipeline::bootstrap(BuildlineConfig::for_test()).unwrap();
        let publisher = pipeline.publisher();
        pipeline.shutdown().await;
        pipeline.shutdown().await;

        let result = publisher.publish(BuildResult::success("", std::time::Duration::ZERO));

        assert_eq!(result, Err(PublishError::Closed));
        let snapshot = pipeline.metrics().snapshot();
        assert_eq!(snapshot.dropped_results, 1);
        assert_eq!(
            snapshot.drop_reasons.get(drop_reasons::PROCESSOR_STOPPED),
            Some(&1)
        );
    }

    #[test]
    fn test_bootstrap_rejects_invalid_config() {
        let mut config = BuildlineConfig::for_test();
        config.processor.result_channel_capacity = 0;
        let err = BuildPipeline::<String>::bootstrap(config).unwrap_err();
        assert!(matches!(err, crate::BuildlineError::Configuration(_)));
    }
}
