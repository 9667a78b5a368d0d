use buildline_core::processing::{BuildFailure, BuildResult};
use buildline_core::{BuildCache, BuildMetrics};
use proptest::prelude::*;
use std::time::Duration;

#[derive(Debug, Clone)]
enum CacheOp {
    Set(u8, usize),
    Get(u8),
    Invalidate(u8),
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (0u8..12, 0usize..160).prop_map(|(k, n)| CacheOp::Set(k, n)),
        3 => (0u8..12).prop_map(CacheOp::Get),
        1 => (0u8..12).prop_map(CacheOp::Invalidate),
    ]
}

/// Reference LRU: front is most recently used
#[derive(Default)]
struct ModelCache {
    entries: Vec<(String, usize)>,
}

impl ModelCache {
    fn size(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    fn touch(&mut self, key: &str) -> bool {
        match self.entries.iter().position(|(k, _)| k == key) {
            Some(index) => {
                let entry = self.entries.remove(index);
                self.entries.insert(0, entry);
                true
            }
            None => false,
        }
    }

    fn set(&mut self, key: String, len: usize, max: usize) {
        if self.touch(&key) {
            self.entries[0].1 = len;
            while self.size() > max && self.entries.len() > 1 {
                self.entries.pop();
            }
        } else {
            while self.size() + len > max && !self.entries.is_empty() {
                self.entries.pop();
            }
            self.entries.insert(0, (key, len));
        }
    }

    fn invalidate(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }
}

proptest! {
    /// Property: the cache follows a reference LRU model exactly
    #[test]
    fn cache_matches_reference_lru(
        max in 50usize..400,
        ops in prop::collection::vec(cache_op_strategy(), 1..80),
    ) {
        let cache = BuildCache::new(max, Duration::from_secs(3600));
        let mut model = ModelCache::default();

        for op in ops {
            match op {
                CacheOp::Set(k, n) => {
                    let key = format!("component-{k}");
                    cache.set(key.clone(), vec![k; n]);
                    model.set(key, n, max);
                }
                CacheOp::Get(k) => {
                    let key = format!("component-{k}");
                    let hit = cache.get(&key);
                    let expected = model.touch(&key);
                    prop_assert_eq!(hit.is_some(), expected);
                }
                CacheOp::Invalidate(k) => {
                    let key = format!("component-{k}");
                    cache.invalidate(&key);
                    model.invalidate(&key);
                }
            }

            prop_assert_eq!(cache.keys(), model.keys());
            prop_assert_eq!(cache.stats().current_size, model.size());
        }
    }

    /// Property: size stays within budget unless a single entry exceeds it
    #[test]
    fn cache_size_is_bounded(
        max in 1usize..256,
        sizes in prop::collection::vec(0usize..300, 1..40),
    ) {
        let cache = BuildCache::new(max, Duration::from_secs(3600));
        for (i, n) in sizes.iter().enumerate() {
            cache.set(format!("k{}", i % 7), vec![0u8; *n]);
            let stats = cache.stats();
            prop_assert!(stats.current_size <= max || stats.entries == 1);
        }
    }

    /// Property: rates are exact percentages of recorded builds
    #[test]
    fn metric_rates_are_percentages(
        outcomes in prop::collection::vec((any::<bool>(), any::<bool>()), 1..200),
    ) {
        let metrics = BuildMetrics::new();
        for (i, (hit, failed)) in outcomes.iter().enumerate() {
            let mut result = if *failed {
                BuildResult::failure("c", Duration::from_millis(i as u64), BuildFailure::new("boom"))
            } else {
                BuildResult::success("c", Duration::from_millis(i as u64))
            };
            result.cache_hit = *hit;
            metrics.record_build(&result);
        }

        let total = outcomes.len() as f64;
        let hits = outcomes.iter().filter(|(h, _)| *h).count() as f64;
        let ok = outcomes.iter().filter(|(_, f)| !*f).count() as f64;

        prop_assert!((metrics.cache_hit_rate() - hits * 100.0 / total).abs() < 1e-9);
        prop_assert!((metrics.success_rate() - ok * 100.0 / total).abs() < 1e-9);
        prop_assert!(metrics.cache_hit_rate() <= 100.0);
    }
}
