//! Image Cache Module
//!
//! Caches raw uploads, thumbnails and processed variants of listing images
//! in one `LruCache`, grouped by owning property so that every derived key
//! can be dropped at once.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::cache::{hit_rate, CacheStats, LruCache};
use crate::config::ImageCacheConfig;
use crate::tasks::{spawn_cleanup_task, CleanupHandle, Sweep};

/// Cached image bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedImage {
    pub data: Arc<[u8]>,
    pub content_type: String,
}

impl CachedImage {
    pub fn new(data: impl Into<Arc<[u8]>>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Number of image bytes, the weight counted against the byte bound.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Output encoding of a processed variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Avif,
}

impl ImageFormat {
    /// Fixed token used in cache keys.
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Avif => "avif",
        }
    }
}

/// Parameters of a processed image variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantSpec {
    pub width: u32,
    pub height: u32,
    /// Encoder quality, 1-100
    pub quality: u8,
    pub format: ImageFormat,
}

impl VariantSpec {
    pub fn new(width: u32, height: u32, quality: u8, format: ImageFormat) -> Self {
        Self {
            width,
            height,
            quality,
            format,
        }
    }
}

// == Keys ==
// Ids come from request paths, so ':' and '%' are percent-escaped and every
// other key segment is a number or a fixed token. Two distinct (id, kind)
// pairs can therefore never share a key.
fn escape_id(id: &str) -> Cow<'_, str> {
    if !id.contains(|c| c == ':' || c == '%') {
        return Cow::Borrowed(id);
    }
    let mut escaped = String::with_capacity(id.len() + 4);
    for ch in id.chars() {
        match ch {
            '%' => escaped.push_str("%25"),
            ':' => escaped.push_str("%3A"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}

/// Key of a raw upload.
pub fn image_key(id: &str) -> String {
    format!("image:{}", escape_id(id))
}

/// Key of a square thumbnail.
pub fn thumbnail_key(id: &str, size: u32) -> String {
    format!("thumb:{}:{size}", escape_id(id))
}

/// Key of a processed variant.
pub fn variant_key(id: &str, spec: &VariantSpec) -> String {
    format!(
        "variant:{}:{}:{}:{}:{}",
        escape_id(id),
        spec.width,
        spec.height,
        spec.quality,
        spec.format.as_str()
    )
}

/// Image cache statistics exposed on the diagnostics endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageCacheStats {
    pub enabled: bool,
    #[serde(flatten)]
    pub cache: CacheStats,
    pub hit_rate: f64,
    pub thumbnail_hits: u64,
    pub thumbnail_misses: u64,
    pub thumbnail_hit_rate: f64,
    pub variant_hits: u64,
    pub variant_misses: u64,
    pub variant_hit_rate: f64,
    /// Keys held by the reverse index
    pub indexed_keys: usize,
}

#[derive(Debug, Default)]
struct CategoryCounter {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CategoryCounter {
    fn record(&self, hit: bool) {
        let counter = if hit { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn load(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

// == Reverse Index ==
/// Property id -> derived keys, plus the inverse so a single key can be
/// forgotten when the LRU drops it.
#[derive(Debug, Default)]
struct Groups {
    by_id: HashMap<String, HashSet<String>>,
    owners: HashMap<String, String>,
}

impl Groups {
    fn record(&mut self, id: &str, key: &str) {
        if self.owners.contains_key(key) {
            return;
        }
        self.owners.insert(key.to_string(), id.to_string());
        self.by_id
            .entry(id.to_string())
            .or_default()
            .insert(key.to_string());
    }

    fn forget(&mut self, key: &str) {
        let Some(id) = self.owners.remove(key) else {
            return;
        };
        if let Some(keys) = self.by_id.get_mut(&id) {
            keys.remove(key);
            if keys.is_empty() {
                self.by_id.remove(&id);
            }
        }
    }

    fn take(&mut self, id: &str) -> HashSet<String> {
        let keys = self.by_id.remove(id).unwrap_or_default();
        for key in &keys {
            self.owners.remove(key);
        }
        keys
    }

    fn clear(&mut self) {
        self.by_id.clear();
        self.owners.clear();
    }

    fn len(&self) -> usize {
        self.owners.len()
    }
}

// == Image Cache ==
/// Cache for listing images keyed by property id.
///
/// Keys written for a property are remembered in a reverse index. A key leaves
/// the index when it is invalidated, evicted, swept, or found missing on a
/// lookup, so the index never outgrows the cache.
pub struct ImageCache {
    cache: Arc<LruCache<CachedImage>>,
    config: ImageCacheConfig,
    groups: Mutex<Groups>,
    thumbnails: CategoryCounter,
    variants: CategoryCounter,
}

impl ImageCache {
    pub fn new(config: ImageCacheConfig) -> Self {
        Self {
            cache: Arc::new(LruCache::new(config.capacity, config.max_size_bytes)),
            config,
            groups: Mutex::new(Groups::default()),
            thumbnails: CategoryCounter::default(),
            variants: CategoryCounter::default(),
        }
    }

    /// When false every lookup misses and every store is dropped.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    // == Raw Uploads ==
    /// Looks up the raw upload of `id`.
    pub fn get(&self, id: &str) -> Option<CachedImage> {
        if !self.is_enabled() {
            return None;
        }
        self.lookup(&image_key(id))
    }

    pub fn set(&self, id: &str, data: impl Into<Arc<[u8]>>, content_type: &str) {
        self.store(id, image_key(id), CachedImage::new(data, content_type));
    }

    // == Thumbnails ==
    pub fn get_thumbnail(&self, id: &str, size: u32) -> Option<CachedImage> {
        if !self.is_enabled() {
            return None;
        }
        let found = self.lookup(&thumbnail_key(id, size));
        self.thumbnails.record(found.is_some());
        found
    }

    pub fn set_thumbnail(
        &self,
        id: &str,
        size: u32,
        data: impl Into<Arc<[u8]>>,
        content_type: &str,
    ) {
        self.store(
            id,
            thumbnail_key(id, size),
            CachedImage::new(data, content_type),
        );
    }

    // == Variants ==
    pub fn get_variant(&self, id: &str, spec: &VariantSpec) -> Option<CachedImage> {
        if !self.is_enabled() {
            return None;
        }
        let found = self.lookup(&variant_key(id, spec));
        self.variants.record(found.is_some());
        found
    }

    pub fn set_variant(
        &self,
        id: &str,
        spec: &VariantSpec,
        data: impl Into<Arc<[u8]>>,
        content_type: &str,
    ) {
        self.store(
            id,
            variant_key(id, spec),
            CachedImage::new(data, content_type),
        );
    }

    // A miss may mean the LRU dropped the key; forget it unless a writer has
    // put it back in the meantime.
    fn lookup(&self, key: &str) -> Option<CachedImage> {
        let found = self.cache.get(key);
        if found.is_none() {
            let mut groups = self.groups.lock();
            if !self.cache.contains(key) {
                groups.forget(key);
            }
        }
        found
    }

    // The group lock is held across the cache write so an invalidation can
    // never miss a key that is being inserted.
    fn store(&self, id: &str, key: String, image: CachedImage) {
        if !self.is_enabled() {
            return;
        }
        let size = image.len() as u64;

        let mut groups = self.groups.lock();
        groups.record(id, &key);
        for evicted in self.cache.insert(key, image, size, self.config.ttl) {
            groups.forget(&evicted);
        }
    }

    // == Invalidate ==
    /// Drops every cached raw image, thumbnail and variant of `id`.
    ///
    /// Returns the number of entries actually removed.
    pub fn invalidate_image(&self, id: &str) -> usize {
        let removed = {
            let mut groups = self.groups.lock();
            groups
                .take(id)
                .iter()
                .filter(|key| self.cache.delete(key))
                .count()
        };

        debug!(property_id = id, removed, "invalidated cached images");
        removed
    }

    /// Keys currently recorded for `id`, sorted.
    pub fn tracked_keys(&self, id: &str) -> Vec<String> {
        let groups = self.groups.lock();
        let mut keys: Vec<String> = groups
            .by_id
            .get(id)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    // == Clear ==
    /// Drops all entries and the reverse index. Counters are kept.
    pub fn clear(&self) {
        let mut groups = self.groups.lock();
        self.cache.clear();
        groups.clear();
    }

    // == Expiry Sweep ==
    /// Removes expired images and their reverse-index entries.
    ///
    /// Returns the number of images removed.
    pub fn cleanup_expired(&self) -> usize {
        self.cache
            .expired_keys()
            .iter()
            .filter(|key| {
                let mut groups = self.groups.lock();
                let removed = self.cache.remove_if_expired(key);
                if removed {
                    groups.forget(key);
                }
                removed
            })
            .count()
    }

    // == Stats ==
    pub fn stats(&self) -> ImageCacheStats {
        let indexed_keys = self.groups.lock().len();
        let cache = self.cache.stats();
        let (thumbnail_hits, thumbnail_misses) = self.thumbnails.load();
        let (variant_hits, variant_misses) = self.variants.load();

        ImageCacheStats {
            enabled: self.is_enabled(),
            cache,
            hit_rate: cache.hit_rate(),
            thumbnail_hits,
            thumbnail_misses,
            thumbnail_hit_rate: hit_rate(thumbnail_hits, thumbnail_misses),
            variant_hits,
            variant_misses,
            variant_hit_rate: hit_rate(variant_hits, variant_misses),
            indexed_keys,
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
    pub fn spawn_cleanup(self: &Arc<Self>) -> Option<CleanupHandle> {
        if !self.is_enabled() || self.config.cleanup_interval.is_zero() {
            return None;
        }
        Some(spawn_cleanup_task(
            Arc::clone(self),
            self.config.cleanup_interval,
            "images",
        ))
    }
}

impl Sweep for ImageCache {
    fn sweep(&self) -> usize {
        self.cleanup_expired()
    }
}
