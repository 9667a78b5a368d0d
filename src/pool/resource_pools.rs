//! The set of pools a build executor draws from

use std::path::PathBuf;
use std::sync::Arc;

use super::execution_context::{BufferLimits, ExecutionContext};
use super::object_pool::{Pool, PoolStats};
use super::worker_handle::WorkerHandle;
use crate::config::PoolConfig;
use crate::constants::pool_limits;
use crate::processing::ParsedError;

/// Pooled list of parsed errors attached to a failed build
pub type ErrorList = Vec<Arc<dyn ParsedError>>;

/// One pool per resource kind. `C` is the scheduler's component metadata
/// record, treated as an opaque list element.
///
/// Single build tasks and result records are deliberately not pooled; only
/// buffers, lists and contexts are worth the exchange overhead.
pub struct ResourcePools<C: Send + 'static> {
    output_buffers: Pool<Vec<u8>>,
    contexts: Pool<ExecutionContext>,
    workers: Pool<WorkerHandle>,
    component_lists: Pool<Vec<C>>,
    string_lists: Pool<Vec<String>>,
    error_lists: Pool<ErrorList>,
}

impl<C: Send + 'static> std::fmt::Debug for ResourcePools<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePools")
            .field("stats", &self.stats())
            .finish()
    }
}

impl<C: Send + 'static> Default for ResourcePools<C> {
    fn default() -> Self {
        Self::new(&PoolConfig::default())
    }
}

impl<C: Send + 'static> ResourcePools<C> {
    pub fn new(config: &PoolConfig) -> Self {
        let limits = BufferLimits {
            max_output_bytes: config.max_output_buffer_bytes,
            max_error_bytes: config.max_error_buffer_bytes,
        };
        let context_ceiling = limits.max_output_bytes + limits.max_error_bytes;
        let context_root: PathBuf = config.temp_root.clone();
        let worker_root: PathBuf = config.temp_root.clone();

        Self {
            output_buffers: Pool::new(
                "output_buffers",
                config.max_idle,
                config.max_output_buffer_bytes,
                || Vec::with_capacity(pool_limits::INITIAL_OUTPUT_BUFFER_BYTES),
            ),
            contexts: Pool::new("execution_contexts", config.max_idle, context_ceiling, move || {
                ExecutionContext::new(&context_root, limits)
            }),
            workers: Pool::new("worker_handles", config.max_idle, context_ceiling, move || {
                WorkerHandle::new(ExecutionContext::new(&worker_root, limits))
            }),
            component_lists: Pool::new(
                "component_lists",
                config.max_idle,
                config.max_component_list_len,
                || Vec::with_capacity(pool_limits::INITIAL_LIST_CAPACITY),
            ),
            string_lists: Pool::new(
                "string_lists",
                config.max_idle,
                config.max_string_list_len,
                || Vec::with_capacity(pool_limits::INITIAL_LIST_CAPACITY),
            ),
            error_lists: Pool::new(
                "error_lists",
                config.max_idle,
                config.max_error_list_len,
                Vec::new,
            ),
        }
    }

    pub fn output_buffers(&self) -> &Pool<Vec<u8>> {
        &self.output_buffers
    }

    pub fn contexts(&self) -> &Pool<ExecutionContext> {
        &self.contexts
    }

    pub fn workers(&self) -> &Pool<WorkerHandle> {
        &self.workers
    }

    pub fn component_lists(&self) -> &Pool<Vec<C>> {
        &self.component_lists
    }

    pub fn string_lists(&self) -> &Pool<Vec<String>> {
        &self.string_lists
    }

    pub fn error_lists(&self) -> &Pool<ErrorList> {
        &self.error_lists
    }

    /// Borrow a worker already marked busy
    pub fn acquire_worker(&self) -> WorkerHandle {
        let mut worker = self.workers.acquire();
        worker.mark_busy();
        worker
    }

    pub fn release_worker(&self, worker: impl Into<Option<WorkerHandle>>) {
        self.workers.release(worker);
    }

    pub fn stats(&self) -> Vec<PoolStats> {
        vec![
            self.output_buffers.stats(),
            self.contexts.stats(),
            self.workers.stats(),
            self.component_lists.stats(),
            self.string_lists.stats(),
            self.error_lists.stats(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::WorkerState;

    #[derive(Debug, Clone)]
    struct Component {
        _name: String,
    }

    fn pools() -> ResourcePools<Component> {
        ResourcePools::new(&PoolConfig {
            max_idle: 8,
            ..PoolConfig::default()
        })
    }

    #[test]
    fn test_component_list_ceiling() {
        let pools = pools();
        let mut small = pools.component_lists().acquire();
        small.push(Component {
            _name: "header".to_string(),
        });
        pools.component_lists().release(small);
        assert_eq!(pools.component_lists().idle_count(), 1);

        let mut large = pools.component_lists().acquire();
        large.reserve(5000);
        pools.component_lists().release(large);
        assert_eq!(pools.component_lists().idle_count(), 0);
        assert_eq!(pools.component_lists().stats().discarded, 1);
    }

    #[test]
    fn test_output_buffer_ceiling_is_one_mebibyte() {
        let pools = pools();
        let mut buf = pools.output_buffers().acquire();
        buf.extend_from_slice(&vec![0u8; 2 * 1024 * 1024]);
        pools.output_buffers().release(buf);
        assert_eq!(pools.output_buffers().idle_count(), 0);

        let buf = pools.output_buffers().acquire();
        assert!(buf.capacity() <= 1024 * 1024);
        pools.output_buffers().release(buf);
        assert_eq!(pools.output_buffers().idle_count(), 1);
    }

    #[test]
    fn test_worker_roundtrip() {
        let pools = pools();
        let mut worker = pools.acquire_worker();
        assert_eq!(worker.state(), WorkerState::Busy);
        let id = worker.id();
        worker.context_mut().write_output(b"ok");
        pools.release_worker(worker);

        let worker = pools.acquire_worker();
        assert_eq!(worker.id(), id);
        assert!(worker.context().output().is_empty());
        assert_eq!(worker.builds_run(), 2);
    }

    #[test]
    fn test_stopped_worker_is_not_pooled() {
        let pools = pools();
        let mut worker = pools.acquire_worker();
        worker.stop();
        pools.release_worker(worker);
        pools.release_worker(None);

        assert_eq!(pools.workers().idle_count(), 0);
        assert_eq!(pools.workers().stats().discarded, 1);
    }

    #[test]
    fn test_stats_cover_every_pool() {
        let pools = pools();
        let names: Vec<_> = pools.stats().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "output_buffers",
                "execution_contexts",
                "worker_handles",
                "component_lists",
                "string_lists",
                "error_lists"
            ]
        );
    }
}
