//! Cache Module
//!
//! In-process caching engine: a generic LRU store bounded by entry count and
//! bytes with per-entry TTL, plus the image and property layers built on it.

mod entry;
mod image;
mod lru;
mod property;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use image::{CachedImage, ImageCache, ImageCacheStats, ImageFormat, VariantSpec};
pub use lru::{LruList, SlotId};
pub use property::{normalize_query, CachedListing, PropertyCache, PropertyCacheStats};
pub use stats::{hit_rate, CacheStats};
pub use store::{LruCache, SWEEP_BATCH};

// == Public Constants ==
/// Entry bound used when a configured capacity is negative
pub const DEFAULT_CAPACITY: usize = 1000;

/// Byte bound used when a configured size limit is negative
pub const DEFAULT_MAX_SIZE_BYTES: u64 = 100 * 1024 * 1024; // 100 MB
