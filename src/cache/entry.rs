//! Cached build output entry

use bytes::Bytes;
use std::time::{Duration, Instant};

/// One cached build output, owned exclusively by [`BuildCache`](super::BuildCache)
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub(crate) value: Bytes,
    pub(crate) size: usize,
    pub(crate) created_at: Instant,
    pub(crate) last_accessed: Instant,
}

impl CacheEntry {
    pub(crate) fn new(value: Bytes, now: Instant) -> Self {
        Self {
            size: value.len(),
            value,
            created_at: now,
            last_accessed: now,
        }
    }

    /// Expiry is absolute: measured from the last write, never extended by reads
    pub(crate) fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > ttl
    }

    /// Replace the payload, returning the previous size
    pub(crate) fn replace(&mut self, value: Bytes, now: Instant) -> usize {
        let old_size = self.size;
        self.size = value.len();
        self.value = value;
        self.created_at = now;
        self.last_accessed = now;
        old_size
    }
}
