//! Per-build scratch state loaned to a worker for one build

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::object_pool::Recyclable;
use crate::constants::pool_limits;
use crate::logging::log_pool_operation;

/// Capacity limits applied to context buffers when the context is returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferLimits {
    pub max_output_bytes: usize,
    pub max_error_bytes: usize,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            max_output_bytes: pool_limits::MAX_OUTPUT_BUFFER_BYTES,
            max_error_bytes: pool_limits::MAX_ERROR_BUFFER_BYTES,
        }
    }
}

/// Temp directory, captured output/error streams and environment for one build.
///
/// The temp directory path is assigned once and kept across reuse; creating
/// and cleaning the directory is left to the executor.
#[derive(Debug)]
pub struct ExecutionContext {
    id: Uuid,
    temp_dir: PathBuf,
    output: Vec<u8>,
    errors: Vec<u8>,
    env: HashMap<String, String>,
    limits: BufferLimits,
}

impl ExecutionContext {
    pub fn new(temp_root: &Path, limits: BufferLimits) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            temp_dir: temp_root.join(format!("buildline-{}", id.simple())),
            output: Vec::with_capacity(pool_limits::INITIAL_OUTPUT_BUFFER_BYTES),
            errors: Vec::with_capacity(pool_limits::INITIAL_ERROR_BUFFER_BYTES),
            env: HashMap::new(),
            limits,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn write_output(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    pub fn write_error(&mut self, bytes: &[u8]) {
        self.errors.extend_from_slice(bytes);
    }

    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn error_output(&self) -> &[u8] {
        &self.errors
    }

    /// Hand the output buffer to the caller, leaving an empty one behind
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }

    pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env.insert(key.into(), value.into());
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn output_capacity(&self) -> usize {
        self.output.capacity()
    }

    pub fn error_capacity(&self) -> usize {
        self.errors.capacity()
    }
}

impl Recyclable for ExecutionContext {
    fn retained_capacity(&self) -> usize {
        self.output.capacity() + self.errors.capacity()
    }

    fn reset(&mut self) {
        if self.output.capacity() > self.limits.max_output_bytes {
            log_pool_operation(
                "output_buffer",
                "oversized",
                self.output.capacity(),
                self.limits.max_output_bytes,
            );
            self.output = Vec::with_capacity(pool_limits::INITIAL_OUTPUT_BUFFER_BYTES);
        } else {
            self.output.clear();
        }

        if self.errors.capacity() > self.limits.max_error_bytes {
            log_pool_operation(
                "error_buffer",
                "oversized",
                self.errors.capacity(),
                self.limits.max_error_bytes,
            );
            self.errors = Vec::with_capacity(pool_limits::INITIAL_ERROR_BUFFER_BYTES);
        } else {
            self.errors.clear();
        }

        // Keep the map's allocation for the next build
        self.env.clear();
    }
}
