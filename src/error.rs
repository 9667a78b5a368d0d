//! Error types for the Buildline core.
//!
//! Steady-state operations (cache reads and writes, pool exchange, metric
//! recording) are infallible. Only lifecycle and configuration surfaces
//! return errors.

use thiserror::Error;

use crate::config::ConfigurationError;
use crate::pipeline::PublishError;
use crate::processing::ProcessorError;

#[derive(Debug, Error)]
pub enum BuildlineError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("Processor error: {0}")]
    Processor(#[from] ProcessorError),
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
}

pub type BuildlineResult<T> = Result<T, BuildlineError>;
