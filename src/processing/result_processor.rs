//! # Result Processor
//!
//! Drains the build result stream on one background task, records every
//! result into [`BuildMetrics`], prints parsed compiler diagnostics and fans
//! the result out to registered callbacks.
//!
//! ## Lifecycle
//!
//! ```text
//! Idle --start_processing--> Running --stop--> Stopped
//!   \_______________________stop_______________/
//! ```
//!
//! `Stopped` is terminal. Starting twice, or after a stop, is rejected so a
//! second loop can never shadow and leak the first.
//!
//! ## Ordering
//!
//! Callbacks for one result finish before the next result is dequeued. A
//! slow callback delays delivery but never blocks producers beyond the
//! channel's own capacity. Cancellation is checked at the wait point and
//! wins over results already buffered in the channel.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::callbacks::{panic_message, CallbackHandle, CallbackRegistry};
use super::types::{BuildResult, ErrorParser, ParsedError, ResultEnvelope};
use crate::logging::log_processor_operation;
use crate::metrics::BuildMetrics;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessorError {
    #[error("Result processor is already running")]
    AlreadyRunning,
    #[error("Result processor has been stopped")]
    AlreadyStopped,
    #[error("No Tokio runtime available to spawn the processing task")]
    NoRuntime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorState {
    Idle,
    Running,
    Stopped,
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessorState::Idle => write!(f, "idle"),
            ProcessorState::Running => write!(f, "running"),
            ProcessorState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Everything the background task needs to handle one result
#[derive(Clone)]
struct ResultHandler {
    callbacks: Arc<CallbackRegistry>,
    metrics: Arc<BuildMetrics>,
    error_parser: Option<Arc<dyn ErrorParser>>,
}

impl ResultHandler {
    fn handle(&self, result: &BuildResult) {
        self.metrics.record_build(result);

        if let Some(failure) = &result.error {
            // Parser and diagnostics are external code; a panic there must not end the loop
            let emitted = catch_unwind(AssertUnwindSafe(|| {
                if !result.parsed_errors.is_empty() {
                    emit_diagnostics(&result.component, &result.parsed_errors);
                } else if let Some(parser) = &self.error_parser {
                    emit_diagnostics(&result.component, &parser.parse(failure));
                }
            }));
            if let Err(panic) = emitted {
                error!(
                    component = %result.component,
                    panic_msg = %panic_message(panic.as_ref()),
                    "Error diagnostics panicked"
                );
            }
        }

        let outcome = self.callbacks.invoke_all(result);
        for _ in 0..outcome.failed {
            self.metrics.record_callback_failure();
        }
    }
}

fn emit_diagnostics(component: &str, parsed_errors: &[Arc<dyn ParsedError>]) {
    for parsed in parsed_errors {
        error!(component = %component, "{}", parsed.format_error());
    }
}

async fn run_processing_loop(
    processor_id: Uuid,
    mut results: mpsc::Receiver<ResultEnvelope>,
    handler: ResultHandler,
    shutdown: CancellationToken,
) {
    debug!(processor_id = %processor_id, "Result processing loop started");

    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => {
                debug!(processor_id = %processor_id, "Shutdown signal received");
                break;
            }
            item = results.recv() => match item {
                Some(ResultEnvelope::Build(result)) => handler.handle(&result),
                Some(ResultEnvelope::Unrecognized { description }) => {
                    handler.metrics.record_invalid_result();
                    debug!(
                        processor_id = %processor_id,
                        description = %description,
                        "Discarding unrecognized result stream item"
                    );
                }
                None => {
                    info!(processor_id = %processor_id, "Result stream closed");
                    break;
                }
            }
        }
    }

    debug!(processor_id = %processor_id, "Result processing loop exited");
}

/// Background distributor of build results to registered callbacks
pub struct ResultProcessor {
    id: Uuid,
    callbacks: Arc<CallbackRegistry>,
    metrics: Arc<BuildMetrics>,
    error_parser: Option<Arc<dyn ErrorParser>>,
    shutdown: CancellationToken,
    state: Mutex<ProcessorState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for ResultProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultProcessor")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("callbacks", &self.callbacks.len())
            .field("has_error_parser", &self.error_parser.is_some())
            .finish()
    }
}

impl ResultProcessor {
    pub fn new(metrics: Arc<BuildMetrics>) -> Self {
        Self {
            id: Uuid::new_v4(),
            callbacks: Arc::new(CallbackRegistry::new()),
            metrics,
            error_parser: None,
            shutdown: CancellationToken::new(),
            state: Mutex::new(ProcessorState::Idle),
            task: Mutex::new(None),
        }
    }

    /// Parser consulted for failed results that arrive without parsed errors
    pub fn with_error_parser(mut self, parser: Arc<dyn ErrorParser>) -> Self {
        self.error_parser = Some(parser);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> ProcessorState {
        *self.state.lock()
    }

    /// True while the processing task is alive. Turns false once the stream
    /// closes, even before `stop` is called.
    pub fn is_running(&self) -> bool {
        self.state() == ProcessorState::Running
            && self
                .task
                .lock()
                .as_ref()
                .is_some_and(|task| !task.is_finished())
    }

    pub fn metrics(&self) -> &Arc<BuildMetrics> {
        &self.metrics
    }

    pub fn add_callback<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(&BuildResult) + Send + Sync + 'static,
    {
        self.callbacks.add(callback)
    }

    pub fn remove_callback(&self, handle: CallbackHandle) -> bool {
        self.callbacks.remove(handle)
    }

    pub fn clear_callbacks(&self) {
        self.callbacks.clear();
    }

    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }

    /// Spawn the processing task on the current Tokio runtime
    pub fn start_processing(
        &self,
        results: mpsc::Receiver<ResultEnvelope>,
    ) -> Result<(), ProcessorError> {
        let runtime = Handle::try_current().map_err(|_| ProcessorError::NoRuntime)?;

        let mut state = self.state.lock();
        match *state {
            ProcessorState::Running => return Err(ProcessorError::AlreadyRunning),
            ProcessorState::Stopped => return Err(ProcessorError::AlreadyStopped),
            ProcessorState::Idle => {}
        }

        let handler = ResultHandler {
            callbacks: self.callbacks.clone(),
            metrics: self.metrics.clone(),
            error_parser: self.error_parser.clone(),
        };
        let task = runtime.spawn(run_processing_loop(
            self.id,
            results,
            handler,
            self.shutdown.clone(),
        ));
        *self.task.lock() = Some(task);
        *state = ProcessorState::Running;

        log_processor_operation(&self.id.to_string(), "start", "running", None);
        Ok(())
    }

    /// Stop processing and wait for the background task to exit.
    ///
    /// Idempotent: later calls return immediately. Once this returns no
    /// further callback is invoked.
    pub async fn stop(&self) {
        // Cancel before the state check so a concurrent second stop never
        // returns while the loop can still dequeue
        self.shutdown.cancel();

        {
            let mut state = self.state.lock();
            if *state == ProcessorState::Stopped {
                return;
            }
            *state = ProcessorState::Stopped;
        }

        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(processor_id = %self.id, error = %e, "Result processing task failed");
            }
        }

        log_processor_operation(&self.id.to_string(), "stop", "stopped", None);
    }

    /// Blocking form of [`stop`](Self::stop) for synchronous callers.
    ///
    /// Must not be called from inside an async context or from a callback.
    pub fn stop_blocking(&self) {
        futures::executor::block_on(self.stop());
    }
}

impl Drop for ResultProcessor {
    fn drop(&mut self) {
        // Never leave a detached loop behind
        self.shutdown.cancel();
    }
}
