//! # Resource Pools
//!
//! Reusable buffers, lists, execution contexts and worker handles that
//! amortize allocation cost across builds.
//!
//! Each resource kind has its own statically typed [`Pool`]; pools share no
//! locks. A pool hands out a fresh item when empty and refuses to keep items
//! that grew beyond its ceiling on release.
//!
//! ```rust
//! use buildline_core::pool::ResourcePools;
//!
//! let pools: ResourcePools<String> = ResourcePools::default();
//! let mut buf = pools.output_buffers().acquire();
//! buf.extend_from_slice(b"<main>...</main>");
//! pools.output_buffers().release(buf);
//! assert_eq!(pools.output_buffers().idle_count(), 1);
//! ```

mod execution_context;
mod object_pool;
mod resource_pools;
mod worker_handle;

pub use execution_context::{BufferLimits, ExecutionContext};
pub use object_pool::{Pool, PoolStats, Recyclable};
pub use resource_pools::{ErrorList, ResourcePools};
pub use worker_handle::{WorkerHandle, WorkerState};
