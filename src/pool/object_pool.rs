//! Typed, lock-free object pool

use crossbeam::queue::ArrayQueue;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

use crate::logging::log_pool_operation;

/// An item that can be returned to a [`Pool`] and handed out again
pub trait Recyclable: Send {
    /// Memory this item keeps alive while idle, in the pool's unit (bytes or elements)
    fn retained_capacity(&self) -> usize;

    /// Restore neutral state for the next borrower
    fn reset(&mut self);

    /// Whether the item may be pooled at all
    fn is_reusable(&self) -> bool {
        true
    }
}

impl<T: Send> Recyclable for Vec<T> {
    fn retained_capacity(&self) -> usize {
        self.capacity()
    }

    fn reset(&mut self) {
        self.clear();
    }
}

/// Point-in-time pool counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub name: &'static str,
    /// Items built by the factory because the pool was empty
    pub created: u64,
    /// Acquisitions served from idle items
    pub reused: u64,
    /// Items accepted back into the pool
    pub returned: u64,
    /// Items dropped on release (oversized, unusable or pool full)
    pub discarded: u64,
    pub idle: usize,
}

#[derive(Debug, Default)]
struct PoolCounters {
    created: AtomicU64,
    reused: AtomicU64,
    returned: AtomicU64,
    discarded: AtomicU64,
}

type Factory<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Bounded pool of reusable `T`.
///
/// `acquire` never blocks and never fails: an empty pool builds a fresh item.
/// `release` resets the item and keeps it only if its retained capacity is
/// within the pool ceiling, so one unusually large build cannot pin memory
/// for every build that follows.
pub struct Pool<T: Recyclable> {
    name: &'static str,
    idle: ArrayQueue<T>,
    factory: Factory<T>,
    ceiling: usize,
    counters: PoolCounters,
}

impl<T: Recyclable> std::fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("name", &self.name)
            .field("ceiling", &self.ceiling)
            .field("idle", &self.idle.len())
            .finish()
    }
}

impl<T: Recyclable> Pool<T> {
    /// Create a pool keeping at most `max_idle` items whose retained capacity
    /// does not exceed `ceiling`.
    pub fn new<F>(name: &'static str, max_idle: usize, ceiling: usize, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            name,
            idle: ArrayQueue::new(max_idle.max(1)),
            factory: Box::new(factory),
            ceiling,
            counters: PoolCounters::default(),
        }
    }

    pub fn acquire(&self) -> T {
        match self.idle.pop() {
            Some(item) => {
                self.counters.reused.fetch_add(1, Ordering::Relaxed);
                item
            }
            None => {
                self.counters.created.fetch_add(1, Ordering::Relaxed);
                (self.factory)()
            }
        }
    }

    /// Return an item. `None` is accepted and ignored.
    pub fn release(&self, item: impl Into<Option<T>>) {
        let Some(mut item) = item.into() else {
            return;
        };

        if !item.is_reusable() {
            self.discard("unusable", 0);
            return;
        }

        item.reset();

        let retained = item.retained_capacity();
        if retained > self.ceiling {
            self.discard("oversized", retained);
            return;
        }

        match self.idle.push(item) {
            Ok(()) => {
                self.counters.returned.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.discard("pool_full", retained);
            }
        }
    }

    fn discard(&self, reason: &str, retained: usize) {
        self.counters.discarded.fetch_add(1, Ordering::Relaxed);
        trace!(pool = self.name, reason = reason, "Discarding pooled item");
        log_pool_operation(self.name, reason, retained, self.ceiling);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            name: self.name,
            created: self.counters.created.load(Ordering::Relaxed),
            reused: self.counters.reused.load(Ordering::Relaxed),
            returned: self.counters.returned.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
            idle: self.idle.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_pool(max_idle: usize) -> Pool<Vec<u8>> {
        Pool::new("test_buffers", max_idle, 1024, || Vec::with_capacity(16))
    }

    #[test]
    fn test_acquire_creates_when_empty() {
        let pool = buffer_pool(4);
        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert_eq!(pool.stats().created, 1);
        assert_eq!(pool.stats().reused, 0);
    }

    #[test]
    fn test_released_item_is_reset_and_reused() {
        let pool = buffer_pool(4);
        let mut buf = pool.acquire();
        buf.extend_from_slice(b"compiled output");
        let capacity = buf.capacity();
        pool.release(buf);

        let again = pool.acquire();
        assert!(again.is_empty());
        assert_eq!(again.capacity(), capacity);

        let stats = pool.stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.returned, 1);
    }

    #[test]
    fn test_oversized_item_is_discarded() {
        let pool = buffer_pool(4);
        let mut buf = pool.acquire();
        buf.reserve(4096);
        pool.release(buf);

        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_release_none_is_noop() {
        let pool = buffer_pool(4);
        pool.release(None);
        let stats = pool.stats();
        assert_eq!(stats.returned, 0);
        assert_eq!(stats.discarded, 0);
    }

    #[test]
    fn test_full_pool_discards() {
        let pool = buffer_pool(1);
        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        pool.release(b);

        assert_eq!(pool.idle_count(), 1);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_concurrent_exchange() {
        let pool = std::sync::Arc::new(buffer_pool(64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let mut buf = pool.acquire();
                        buf.push(1);
                        pool.release(buf);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = pool.stats();
        assert_eq!(stats.created + stats.reused, 800);
        assert_eq!(stats.returned + stats.discarded, 800);
    }
}
