//! Build result contract shared with the external executor

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A structured compiler diagnostic produced by the external error parser
pub trait ParsedError: fmt::Debug + Send + Sync {
    /// Human readable rendering for the diagnostic output
    fn format_error(&self) -> String;
}

/// Turns a raw build failure into structured diagnostics
pub trait ErrorParser: Send + Sync {
    fn parse(&self, failure: &BuildFailure) -> Vec<Arc<dyn ParsedError>>;
}

/// Raw failure reported by the compile step
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BuildFailure {
    pub message: String,
}

impl BuildFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of one compile attempt
#[derive(Debug, Clone)]
pub struct BuildResult {
    /// Component label, used for log fields and drop attribution
    pub component: String,
    pub duration: Duration,
    pub cache_hit: bool,
    pub error: Option<BuildFailure>,
    pub parsed_errors: Vec<Arc<dyn ParsedError>>,
}

impl BuildResult {
    pub fn success(component: impl Into<String>, duration: Duration) -> Self {
        Self {
            component: component.into(),
            duration,
            cache_hit: false,
            error: None,
            parsed_errors: Vec::new(),
        }
    }

    /// A build served from the cache
    pub fn cached(component: impl Into<String>, duration: Duration) -> Self {
        Self {
            cache_hit: true,
            ..Self::success(component, duration)
        }
    }

    pub fn failure(component: impl Into<String>, duration: Duration, error: BuildFailure) -> Self {
        Self {
            error: Some(error),
            ..Self::success(component, duration)
        }
    }

    pub fn with_parsed_errors(mut self, parsed_errors: Vec<Arc<dyn ParsedError>>) -> Self {
        self.parsed_errors = parsed_errors;
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Item carried by the result stream.
///
/// Producers that decode results from an untyped source forward what they
/// could not decode as `Unrecognized`; the processor counts and drops it.
#[derive(Debug, Clone)]
pub enum ResultEnvelope {
    Build(BuildResult),
    Unrecognized { description: String },
}

impl From<BuildResult> for ResultEnvelope {
    fn from(result: BuildResult) -> Self {
        ResultEnvelope::Build(result)
    }
}
