//! # Build Result Processing
//!
//! The consumer side of the build pipeline. Executors send a
//! [`ResultEnvelope`] per compile attempt on a bounded channel; the
//! [`ResultProcessor`] drains it on a background task:
//!
//! 1. records the result into the shared [`BuildMetrics`](crate::metrics::BuildMetrics)
//! 2. prints parsed diagnostics for failed builds
//! 3. invokes every registered callback, isolating panics
//!
//! Items that are not build results are counted as invalid and dropped.

mod callbacks;
mod result_processor;
mod types;

pub use callbacks::{BuildCallback, CallbackHandle, CallbackOutcome, CallbackRegistry};
pub use result_processor::{ProcessorError, ProcessorState, ResultProcessor};
pub use types::{BuildFailure, BuildResult, ErrorParser, ParsedError, ResultEnvelope};
