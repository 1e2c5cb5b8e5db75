//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check `LruCache` against a simple recency-list model and
//! to verify the image/property cache invalidation guarantees.

use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

use crate::cache::{ImageCache, ImageFormat, LruCache, PropertyCache, VariantSpec};
use crate::config::{ImageCacheConfig, PropertyCacheConfig};
use crate::models::property::fixtures::property;

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]{1,2}".prop_map(|s| s)
}

fn size_strategy() -> impl Strategy<Value = u64> {
    0u64..64
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, size: u64 },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => (key_strategy(), size_strategy()).prop_map(|(key, size)| CacheOp::Set { key, size }),
        2 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

// == Reference Model ==
/// Recency list, most recently used first, with the same eviction rule.
#[derive(Default)]
struct Model {
    entries: Vec<(String, u64)>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl Model {
    fn bytes(&self) -> u64 {
        self.entries.iter().map(|(_, size)| size).sum()
    }

    fn take(&mut self, key: &str) -> Option<(String, u64)> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos))
    }

    fn set(&mut self, key: String, size: u64, capacity: usize, max_bytes: u64) {
        self.take(&key);
        self.entries.insert(0, (key, size));
        while self.entries.len() > 1
            && ((capacity > 0 && self.entries.len() > capacity)
                || (max_bytes > 0 && self.bytes() > max_bytes))
        {
            self.entries.pop();
            self.evictions += 1;
        }
    }

    fn get(&mut self, key: &str) -> bool {
        match self.take(key) {
            Some(entry) => {
                self.entries.insert(0, entry);
                self.hits += 1;
                true
            }
            None => {
                self.misses += 1;
                false
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }
}

fn apply(cache: &LruCache<u64>, model: &mut Model, op: CacheOp) {
    match op {
        CacheOp::Set { key, size } => {
            cache.set(key.clone(), size, size, Duration::ZERO);
            model.set(key, size, cache.capacity(), cache.max_bytes());
        }
        CacheOp::Get { key } => {
            let found = cache.get(&key).is_some();
            assert_eq!(found, model.get(&key), "hit/miss mismatch for {key}");
        }
        CacheOp::Delete { key } => {
            assert_eq!(cache.delete(&key), model.take(&key).is_some());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Entry count never exceeds the configured capacity.
    #[test]
    fn prop_capacity_bound(
        capacity in 1usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..100),
    ) {
        let cache = LruCache::new(capacity, 0);
        let mut model = Model::default();

        for op in ops {
            apply(&cache, &mut model, op);
            prop_assert!(cache.len() <= capacity);
        }
    }

    // Accounted bytes stay within the byte bound unless a single entry is
    // larger than the bound on its own.
    #[test]
    fn prop_byte_bound(
        max_bytes in 1u64..128,
        ops in prop::collection::vec(cache_op_strategy(), 1..100),
    ) {
        let cache = LruCache::new(0, max_bytes);
        let mut model = Model::default();

        for op in ops {
            apply(&cache, &mut model, op);
            let bytes = cache.current_bytes();
            prop_assert!(bytes <= max_bytes || cache.len() == 1, "{} bytes in {} entries", bytes, cache.len());
        }
    }

    // Recency order and eviction victims match the model exactly.
    #[test]
    fn prop_matches_model(
        capacity in 0usize..6,
        max_bytes in prop_oneof![Just(0u64), 32u64..160],
        ops in prop::collection::vec(cache_op_strategy(), 1..120),
    ) {
        let cache = LruCache::new(capacity, max_bytes);
        let mut model = Model::default();

        for op in ops {
            apply(&cache, &mut model, op);
            prop_assert_eq!(cache.keys(), model.keys());
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hits, model.hits);
        prop_assert_eq!(stats.misses, model.misses);
        prop_assert_eq!(stats.evictions, model.evictions);
        prop_assert_eq!(stats.expirations, 0);
    }

    // current_bytes is always the sum of the live entries' sizes.
    #[test]
    fn prop_current_bytes_is_sum(
        ops in prop::collection::vec(cache_op_strategy(), 1..100),
    ) {
        let cache = LruCache::new(4, 100);
        let mut model = Model::default();

        for op in ops {
            apply(&cache, &mut model, op);
            let sum: u64 = cache.keys().iter().filter_map(|k| cache.peek(k)).sum();
            prop_assert_eq!(cache.current_bytes(), sum);
            prop_assert_eq!(cache.stats().current_bytes, sum);
        }
    }

    // A read or write always leaves the key at the head.
    #[test]
    fn prop_touched_key_is_most_recent(
        keys in prop::collection::vec(key_strategy(), 1..20),
        touched in key_strategy(),
    ) {
        let cache = LruCache::new(0, 0);
        for key in &keys {
            cache.set(key.clone(), 1u64, 1, Duration::ZERO);
        }

        cache.set(touched.clone(), 2u64, 1, Duration::ZERO);
        let order = cache.keys();
        prop_assert_eq!(order.first(), Some(&touched));

        if let Some(first) = keys.first() {
            cache.get(first);
            let order = cache.keys();
            prop_assert_eq!(order.first(), Some(first));
        }
    }

    // Clearing twice is the same as clearing once, and counters survive.
    #[test]
    fn prop_clear_idempotent(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let cache = LruCache::new(8, 0);
        let mut model = Model::default();
        for op in ops {
            apply(&cache, &mut model, op);
        }
        let before = cache.stats();

        cache.clear();
        let once = cache.stats();
        cache.clear();
        let twice = cache.stats();

        prop_assert_eq!(once, twice);
        prop_assert_eq!(once.size, 0);
        prop_assert_eq!(once.current_bytes, 0);
        prop_assert_eq!((once.hits, once.misses, once.evictions), (before.hits, before.misses, before.evictions));
    }

    // Invalidating a listing's images removes every thumbnail and variant of
    // that listing and nothing belonging to others.
    #[test]
    fn prop_image_invalidation_complete(
        writes in prop::collection::vec(("[a-c]", 16u32..512, any::<bool>()), 1..40),
        target in "[a-c]",
    ) {
        let cache = ImageCache::new(ImageCacheConfig {
            capacity: 0,
            max_size_bytes: 0,
            ..ImageCacheConfig::default()
        });
        let mut others: HashSet<(String, u32, bool)> = HashSet::new();

        for (id, size, variant) in &writes {
            if *variant {
                let spec = VariantSpec::new(*size, *size, 80, ImageFormat::Webp);
                cache.set_variant(id, &spec, vec![0u8; 4], "image/webp");
            } else {
                cache.set_thumbnail(id, *size, vec![0u8; 4], "image/jpeg");
            }
            if *id != target {
                others.insert((id.clone(), *size, *variant));
            }
        }

        cache.invalidate_image(&target);

        prop_assert!(cache.tracked_keys(&target).is_empty());
        for (id, size, variant) in &writes {
            let found = if *variant {
                cache.get_variant(id, &VariantSpec::new(*size, *size, 80, ImageFormat::Webp)).is_some()
            } else {
                cache.get_thumbnail(id, *size).is_some()
            };
            prop_assert_eq!(found, others.contains(&(id.clone(), *size, *variant)));
        }
    }

    // Under eviction pressure the reverse index never tracks more keys than
    // the cache holds.
    #[test]
    fn prop_image_index_bounded_by_entries(
        capacity in 1usize..6,
        writes in prop::collection::vec(("[a-e]", 16u32..64, any::<bool>()), 1..80),
    ) {
        let cache = ImageCache::new(ImageCacheConfig {
            capacity,
            max_size_bytes: 0,
            ..ImageCacheConfig::default()
        });

        for (id, size, variant) in &writes {
            if *variant {
                let spec = VariantSpec::new(*size, *size, 80, ImageFormat::Avif);
                cache.set_variant(id, &spec, vec![0u8; 4], "image/avif");
            } else {
                cache.set_thumbnail(id, *size, vec![0u8; 4], "image/jpeg");
            }
            let stats = cache.stats();
            prop_assert!(stats.indexed_keys <= cache.len());
            prop_assert!(cache.len() <= capacity);
        }
    }

    // Search pages for the same normalized query share a cache entry.
    #[test]
    fn prop_search_key_normalization(
        words in prop::collection::vec("[a-z]{1,6}", 1..4),
        limit in 1usize..50,
    ) {
        let cache = PropertyCache::new(PropertyCacheConfig::default());
        let query = words.join(" ");
        let noisy = format!("  {}  ", words.join("   ").to_uppercase());
        let results = vec![property("1", "Lyon", 1.0)];

        cache.set_search_results(&query, limit, &results);

        prop_assert_eq!(cache.get_search_results(&noisy, limit), Some(results));
        prop_assert_eq!(cache.get_search_results(&query, limit + 1), None);
    }
}
