//! Property Cache Module
//!
//! Caches single listings, ranked search results and the global statistics
//! aggregate in one `LruCache`, each family under its own key prefix and TTL.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use ahash::RandomState;
use serde::Serialize;
use tracing::debug;

use crate::cache::{hit_rate, LruCache};
use crate::config::PropertyCacheConfig;
use crate::models::{Property, PropertyStatistics};
use crate::tasks::{spawn_cleanup_task, CleanupHandle};

const PROPERTY_PREFIX: &str = "prop:";
const SEARCH_PREFIX: &str = "search:";
/// Key of the single statistics entry
pub const STATISTICS_KEY: &str = "stats:global";

/// Payload stored under one of the three key families.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CachedListing {
    Property(Property),
    SearchResults(Vec<Property>),
    Statistics(PropertyStatistics),
}

impl CachedListing {
    /// Accounted size: the length of the JSON encoding.
    fn weight(&self) -> u64 {
        serde_json::to_vec(self)
            .map(|encoded| encoded.len() as u64)
            .unwrap_or(0)
    }
}

/// Key of a single listing.
pub fn property_key(id: &str) -> String {
    format!("{PROPERTY_PREFIX}{id}")
}

/// Canonical form of a search query: trimmed, lowercased, single-spaced.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Property cache statistics exposed on the diagnostics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropertyCacheStats {
    pub enabled: bool,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub search_hits: u64,
    pub search_misses: u64,
    pub search_hit_rate: f64,
    pub statistics_hits: u64,
    pub statistics_misses: u64,
    pub statistics_hit_rate: f64,
    pub size: usize,
    pub current_bytes: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    search_hits: AtomicU64,
    search_misses: AtomicU64,
    statistics_hits: AtomicU64,
    statistics_misses: AtomicU64,
}

impl Counters {
    fn all(&self) -> [&AtomicU64; 6] {
        [
            &self.hits,
            &self.misses,
            &self.search_hits,
            &self.search_misses,
            &self.statistics_hits,
            &self.statistics_misses,
        ]
    }

    fn reset(&self) {
        for counter in self.all() {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

fn record(hits: &AtomicU64, misses: &AtomicU64, hit: bool) {
    let counter = if hit { hits } else { misses };
    counter.fetch_add(1, Ordering::Relaxed);
}

// == Property Cache ==
/// Read-through cache for listings, search results and statistics.
///
/// Callers invalidate after a successful store write; see
/// `PropertyService` for the full read/write flow.
///
/// Every invalidation bumps a generation counter. A read-through fill
/// carries the generation observed before its store read, and is dropped
/// if an invalidation ran in between.
pub struct PropertyCache {
    cache: Arc<LruCache<CachedListing>>,
    config: PropertyCacheConfig,
    hasher: RandomState,
    counters: Counters,
    generation: AtomicU64,
}

impl PropertyCache {
    pub fn new(config: PropertyCacheConfig) -> Self {
        Self {
            cache: Arc::new(LruCache::new(config.capacity, config.max_size_bytes)),
            config,
            hasher: RandomState::new(),
            counters: Counters::default(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn search_key(&self, query: &str, limit: usize) -> String {
        let hash = self.hasher.hash_one(normalize_query(query));
        format!("{SEARCH_PREFIX}{hash:016x}:{limit}")
    }

    fn put(&self, key: String, value: CachedListing, ttl: Duration) {
        if !self.is_enabled() {
            return;
        }
        let size = value.weight();
        self.cache.set(key, value, size, ttl);
    }

    /// Generation to capture before reading the backing store.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Stores `value` only if no invalidation happened since `observed`.
    ///
    /// An invalidation that lands between the check and the write is caught
    /// by the second check, which takes the entry back out.
    fn fill(&self, key: String, value: CachedListing, ttl: Duration, observed: u64) -> bool {
        if !self.is_enabled() || self.generation() != observed {
            return false;
        }
        self.put(key.clone(), value, ttl);
        if self.generation() != observed {
            self.cache.delete(&key);
            debug!(key = %key, "dropped read-through fill raced by invalidation");
            return false;
        }
        true
    }

    // == Single Listings ==
    pub fn get_property(&self, id: &str) -> Option<Property> {
        if !self.is_enabled() {
            return None;
        }
        let found = match self.cache.get(&property_key(id)) {
            Some(CachedListing::Property(property)) => Some(property),
            _ => None,
        };
        record(&self.counters.hits, &self.counters.misses, found.is_some());
        found
    }

    /// Caches a listing under its id with the default TTL.
    pub fn set_property(&self, property: &Property) {
        self.set_property_with_ttl(property, self.config.default_ttl);
    }

    pub fn set_property_with_ttl(&self, property: &Property, ttl: Duration) {
        self.put(
            property_key(&property.id),
            CachedListing::Property(property.clone()),
            ttl,
        );
    }

    /// Read-through variant of `set_property`. Returns whether it was cached.
    pub fn fill_property(&self, property: &Property, observed: u64) -> bool {
        self.fill(
            property_key(&property.id),
            CachedListing::Property(property.clone()),
            self.config.default_ttl,
            observed,
        )
    }

    // == Search Results ==
    pub fn get_search_results(&self, query: &str, limit: usize) -> Option<Vec<Property>> {
        if !self.is_enabled() {
            return None;
        }
        let found = match self.cache.get(&self.search_key(query, limit)) {
            Some(CachedListing::SearchResults(results)) => Some(results),
            _ => None,
        };
        record(
            &self.counters.search_hits,
            &self.counters.search_misses,
            found.is_some(),
        );
        found
    }

    pub fn set_search_results(&self, query: &str, limit: usize, results: &[Property]) {
        self.put(
            self.search_key(query, limit),
            CachedListing::SearchResults(results.to_vec()),
            self.config.search_ttl,
        );
    }

    pub fn fill_search_results(
        &self,
        query: &str,
        limit: usize,
        results: &[Property],
        observed: u64,
    ) -> bool {
        self.fill(
            self.search_key(query, limit),
            CachedListing::SearchResults(results.to_vec()),
            self.config.search_ttl,
            observed,
        )
    }

    // == Statistics ==
    pub fn get_statistics(&self) -> Option<PropertyStatistics> {
        if !self.is_enabled() {
            return None;
        }
        let found = match self.cache.get(STATISTICS_KEY) {
            Some(CachedListing::Statistics(stats)) => Some(stats),
            _ => None,
        };
        record(
            &self.counters.statistics_hits,
            &self.counters.statistics_misses,
            found.is_some(),
        );
        found
    }

    pub fn set_statistics(&self, statistics: &PropertyStatistics) {
        self.put(
            STATISTICS_KEY.to_string(),
            CachedListing::Statistics(statistics.clone()),
            self.config.statistics_ttl,
        );
    }

    pub fn fill_statistics(&self, statistics: &PropertyStatistics, observed: u64) -> bool {
        self.fill(
            STATISTICS_KEY.to_string(),
            CachedListing::Statistics(statistics.clone()),
            self.config.statistics_ttl,
            observed,
        )
    }

    // == Invalidation ==
    /// Drops the cached listing and the statistics aggregate.
    ///
    /// Statistics cover every row, so any write invalidates them. Returns
    /// whether a cached listing was removed.
    pub fn invalidate_property(&self, id: &str) -> bool {
        self.bump_generation();
        let removed = self.cache.delete(&property_key(id));
        self.clear_statistics();
        debug!(property_id = id, removed, "invalidated cached property");
        removed
    }

    /// Drops every cached search result. Returns how many were removed.
    pub fn clear_search_results(&self) -> usize {
        self.bump_generation();
        self.cache.remove_where(|key| key.starts_with(SEARCH_PREFIX))
    }

    pub fn clear_statistics(&self) -> bool {
        self.bump_generation();
        self.cache.delete(STATISTICS_KEY)
    }

    /// Empties all three families and zeroes the category counters.
    pub fn clear_cache(&self) {
        self.bump_generation();
        self.cache.clear();
        self.counters.reset();
    }

    // == Stats ==
    pub fn stats(&self) -> PropertyCacheStats {
        let base = self.cache.stats();
        let [hits, misses, search_hits, search_misses, statistics_hits, statistics_misses] =
            self.counters.all().map(|counter| counter.load(Ordering::Relaxed));

        PropertyCacheStats {
            enabled: self.is_enabled(),
            hits,
            misses,
            hit_rate: hit_rate(hits, misses),
            search_hits,
            search_misses,
            search_hit_rate: hit_rate(search_hits, search_misses),
            statistics_hits,
            statistics_misses,
            statistics_hit_rate: hit_rate(statistics_hits, statistics_misses),
            size: base.size,
            current_bytes: base.current_bytes,
            evictions: base.evictions,
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    // == Cleanup ==
    /// Starts the expiry sweep when enabled with a non-zero interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_cleanup(&self) -> Option<CleanupHandle> {
        if !self.is_enabled() || self.config.cleanup_interval.is_zero() {
            return None;
        }
        Some(spawn_cleanup_task(
            Arc::clone(&self.cache),
            self.config.cleanup_interval,
            "properties",
        ))
    }
}
