//! # Build Output Cache
//!
//! Size-bounded, TTL-aware store for compiled build outputs with strict
//! least-recently-used eviction.
//!
//! Recency is kept by an [`lru::LruCache`] in unbounded mode; capacity is
//! enforced here in bytes rather than entry count. Every `get` that hits and
//! every `set` moves the entry to the most-recently-used end, so eviction
//! order is a total order by last touch.
//!
//! Expiration is lazy: an entry older than the TTL is removed by the `get`
//! that observes it. There is no background sweeper.

use bytes::Bytes;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::debug;

use super::entry::CacheEntry;
use crate::config::CacheConfig;
use crate::logging::log_cache_operation;

/// Point-in-time cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub current_size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}

struct CacheState {
    entries: LruCache<String, CacheEntry>,
    current_size: usize,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

impl CacheState {
    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.pop(key)?;
        self.current_size -= entry.size;
        Some(entry)
    }

    /// Evict from the LRU end until `incoming` more bytes fit, keeping at
    /// least `keep` entries.
    fn evict_to_fit(&mut self, incoming: usize, max_size: usize, keep: usize) {
        while self.current_size + incoming > max_size && self.entries.len() > keep {
            let Some((key, entry)) = self.entries.pop_lru() else {
                break;
            };
            self.current_size -= entry.size;
            self.evictions += 1;
            log_cache_operation(
                "evict",
                Some(&key),
                self.entries.len(),
                self.current_size,
                None,
            );
        }
    }
}

/// Thread-safe LRU cache of build outputs keyed by input fingerprint
pub struct BuildCache {
    state: Mutex<CacheState>,
    max_size: usize,
    ttl: Duration,
}

impl std::fmt::Debug for BuildCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildCache")
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .field("stats", &self.stats())
            .finish()
    }
}

impl BuildCache {
    /// Create a cache holding at most `max_size` bytes of payload, each entry
    /// living at most `ttl` after it was written.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::unbounded(),
                current_size: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
            max_size,
            ttl,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_size_bytes, config.ttl())
    }

    /// Look up a build output.
    ///
    /// A hit marks the entry most recently used. An expired entry is removed
    /// and reported as a miss.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        let now = Instant::now();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let expired = match state.entries.peek(key) {
            Some(entry) => entry.is_expired(now, self.ttl),
            None => {
                state.misses += 1;
                return None;
            }
        };

        if expired {
            state.remove(key);
            state.expirations += 1;
            state.misses += 1;
            debug!(key = %key, current_size = state.current_size, "Cache entry expired");
            return None;
        }

        let entry = state.entries.get_mut(key)?;
        entry.last_accessed = now;
        let value = entry.value.clone();
        state.hits += 1;
        Some(value)
    }

    /// Store a build output, evicting least recently used entries as needed.
    ///
    /// An entry larger than the whole cache is still stored, alone.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Bytes>) {
        let key = key.into();
        let value = value.into();
        let size = value.len();
        let now = Instant::now();

        let mut guard = self.state.lock();
        let state = &mut *guard;

        if let Some(entry) = state.entries.get_mut(&key) {
            let old_size = entry.replace(value, now);
            state.current_size = state.current_size + size - old_size;
            // The updated entry is now most recent, so only older entries go
            state.evict_to_fit(0, self.max_size, 1);
            return;
        }

        state.evict_to_fit(size, self.max_size, 0);
        state.entries.put(key, CacheEntry::new(value, now));
        state.current_size += size;
    }

    /// Remove one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut state = self.state.lock();
        let removed = state.remove(key).is_some();
        if removed {
            log_cache_operation(
                "invalidate",
                Some(key),
                state.entries.len(),
                state.current_size,
                None,
            );
        }
        removed
    }

    /// Membership test that neither promotes the entry nor removes it when expired
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        let state = self.state.lock();
        state
            .entries
            .peek(key)
            .is_some_and(|entry| !entry.is_expired(now, self.ttl))
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.entries.len();
        state.entries.clear();
        state.current_size = 0;
        log_cache_operation(
            "clear",
            None,
            0,
            0,
            Some(&format!("dropped {dropped} entries")),
        );
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entries: state.entries.len(),
            current_size: state.current_size,
            max_size: self.max_size,
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            expirations: state.expirations,
        }
    }

    /// Keys ordered from most to least recently used
    pub fn keys(&self) -> Vec<String> {
        self.state
            .lock()
            .entries
            .iter()
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
