//! # System Constants
//!
//! Operational limits shared by the cache, pool, metrics and processing
//! layers. Configuration defaults are derived from these values.

/// Size limits for pooled resources
pub mod pool_limits {
    /// Output buffers above this capacity are dropped instead of pooled (1 MiB)
    pub const MAX_OUTPUT_BUFFER_BYTES: usize = 1024 * 1024;
    /// Error buffers above this capacity are dropped instead of pooled (64 KiB)
    pub const MAX_ERROR_BUFFER_BYTES: usize = 64 * 1024;
    /// Component lists above this many elements are dropped instead of pooled
    pub const MAX_COMPONENT_LIST_LEN: usize = 1000;
    pub const MAX_STRING_LIST_LEN: usize = 1000;
    pub const MAX_ERROR_LIST_LEN: usize = 256;

    /// Initial capacity of a freshly created output buffer (64 KiB)
    pub const INITIAL_OUTPUT_BUFFER_BYTES: usize = 64 * 1024;
    /// Initial capacity of a freshly created error buffer (4 KiB)
    pub const INITIAL_ERROR_BUFFER_BYTES: usize = 4 * 1024;
    pub const INITIAL_LIST_CAPACITY: usize = 32;

    /// Idle items kept per pool
    pub const DEFAULT_MAX_IDLE: usize = 256;
}

/// Cache defaults
pub mod cache_defaults {
    /// 256 MiB
    pub const MAX_SIZE_BYTES: usize = 256 * 1024 * 1024;
    /// One hour
    pub const TTL_MS: u64 = 60 * 60 * 1000;
}

/// Result processing defaults
pub mod processing_defaults {
    pub const RESULT_CHANNEL_CAPACITY: usize = 1000;
}

/// Reason labels recorded with dropped work
pub mod drop_reasons {
    pub const RESULT_QUEUE_FULL: &str = "result_queue_full";
    pub const PROCESSOR_STOPPED: &str = "processor_stopped";
    pub const TASK_QUEUE_FULL: &str = "task_queue_full";
}

/// Queue health thresholds, expressed as drop ratio of observed work
pub mod queue_health {
    pub const DEGRADED_DROP_RATIO: f64 = 0.01;
    pub const CRITICAL_DROP_RATIO: f64 = 0.05;
}

/// Component label used when a result carries none
pub const UNKNOWN_COMPONENT: &str = "unknown";
