//! Pooled worker handles

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::execution_context::ExecutionContext;
use super::object_pool::Recyclable;

/// Lifecycle state of a worker handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Idle,
    Busy,
    Stopped,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Idle => write!(f, "idle"),
            WorkerState::Busy => write!(f, "busy"),
            WorkerState::Stopped => write!(f, "stopped"),
        }
    }
}

/// A worker identity with its attached execution context.
///
/// Stopped handles are never returned to the pool.
#[derive(Debug)]
pub struct WorkerHandle {
    id: Uuid,
    state: WorkerState,
    builds_run: u64,
    context: ExecutionContext,
}

impl WorkerHandle {
    pub fn new(context: ExecutionContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: WorkerState::Idle,
            builds_run: 0,
            context,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Number of builds this handle has started across all loans
    pub fn builds_run(&self) -> u64 {
        self.builds_run
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ExecutionContext {
        &mut self.context
    }

    /// Mark the worker busy for a build. A stopped worker stays stopped.
    pub fn mark_busy(&mut self) {
        if self.state != WorkerState::Stopped {
            self.state = WorkerState::Busy;
            self.builds_run += 1;
        }
    }

    pub fn mark_idle(&mut self) {
        if self.state != WorkerState::Stopped {
            self.state = WorkerState::Idle;
        }
    }

    /// Retire the worker; it will be dropped instead of pooled
    pub fn stop(&mut self) {
        self.state = WorkerState::Stopped;
    }

    pub fn is_available(&self) -> bool {
        self.state == WorkerState::Idle
    }
}

impl Recyclable for WorkerHandle {
    fn retained_capacity(&self) -> usize {
        self.context.retained_capacity()
    }

    fn reset(&mut self) {
        self.state = WorkerState::Idle;
        self.context.reset();
    }

    fn is_reusable(&self) -> bool {
        self.state != WorkerState::Stopped
    }
}
