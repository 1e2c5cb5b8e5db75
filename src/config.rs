//! Configuration Module
//!
//! Handles loading server and cache configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_CAPACITY, DEFAULT_MAX_SIZE_BYTES};

/// Settings for the image/thumbnail cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageCacheConfig {
    /// When false the cache is a pass-through: gets miss, sets are dropped
    pub enabled: bool,
    /// Maximum number of entries, 0 = unbounded
    pub capacity: usize,
    /// Maximum total image bytes, 0 = unbounded
    pub max_size_bytes: u64,
    /// Lifetime of every image entry, zero = never expires
    pub ttl: Duration,
    /// Period of the expiry sweep, zero = lazy expiry only
    pub cleanup_interval: Duration,
}

impl Default for ImageCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            ttl: Duration::from_secs(3600),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl ImageCacheConfig {
    /// A configuration that turns the cache into a pass-through.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Settings for the property/search/statistics cache.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCacheConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub max_size_bytes: u64,
    /// TTL for single-property entries
    pub default_ttl: Duration,
    /// TTL for search results, which churn faster than records
    pub search_ttl: Duration,
    /// TTL for aggregate statistics, which are costly to recompute
    pub statistics_ttl: Duration,
    pub cleanup_interval: Duration,
}

impl Default for PropertyCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            default_ttl: Duration::from_secs(300),
            search_ttl: Duration::from_secs(60),
            statistics_ttl: Duration::from_secs(900),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl PropertyCacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    pub image_cache: ImageCacheConfig,
    pub property_cache: PropertyCacheConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `IMAGE_CACHE_ENABLED`, `IMAGE_CACHE_CAPACITY`, `IMAGE_CACHE_MAX_SIZE_BYTES`,
    ///   `IMAGE_CACHE_TTL`, `IMAGE_CACHE_CLEANUP_INTERVAL`
    /// - `PROPERTY_CACHE_ENABLED`, `PROPERTY_CACHE_CAPACITY`,
    ///   `PROPERTY_CACHE_MAX_SIZE_BYTES`, `PROPERTY_CACHE_DEFAULT_TTL`,
    ///   `PROPERTY_CACHE_SEARCH_TTL`, `PROPERTY_CACHE_STATISTICS_TTL`,
    ///   `PROPERTY_CACHE_CLEANUP_INTERVAL`
    ///
    /// Durations are in seconds. Capacities and sizes of 0 mean unbounded;
    /// negative values fall back to the defaults.
    pub fn from_env() -> Self {
        let image = ImageCacheConfig::default();
        let property = PropertyCacheConfig::default();

        Self {
            server_port: env_parse("SERVER_PORT").unwrap_or(3000),
            image_cache: ImageCacheConfig {
                enabled: env_bool("IMAGE_CACHE_ENABLED").unwrap_or(image.enabled),
                capacity: env_parse("IMAGE_CACHE_CAPACITY")
                    .map(normalize_capacity)
                    .unwrap_or(image.capacity),
                max_size_bytes: env_parse("IMAGE_CACHE_MAX_SIZE_BYTES")
                    .map(normalize_max_bytes)
                    .unwrap_or(image.max_size_bytes),
                ttl: env_secs("IMAGE_CACHE_TTL").unwrap_or(image.ttl),
                cleanup_interval: env_secs("IMAGE_CACHE_CLEANUP_INTERVAL")
                    .unwrap_or(image.cleanup_interval),
            },
            property_cache: PropertyCacheConfig {
                enabled: env_bool("PROPERTY_CACHE_ENABLED").unwrap_or(property.enabled),
                capacity: env_parse("PROPERTY_CACHE_CAPACITY")
                    .map(normalize_capacity)
                    .unwrap_or(property.capacity),
                max_size_bytes: env_parse("PROPERTY_CACHE_MAX_SIZE_BYTES")
                    .map(normalize_max_bytes)
                    .unwrap_or(property.max_size_bytes),
                default_ttl: env_secs("PROPERTY_CACHE_DEFAULT_TTL")
                    .unwrap_or(property.default_ttl),
                search_ttl: env_secs("PROPERTY_CACHE_SEARCH_TTL").unwrap_or(property.search_ttl),
                statistics_ttl: env_secs("PROPERTY_CACHE_STATISTICS_TTL")
                    .unwrap_or(property.statistics_ttl),
                cleanup_interval: env_secs("PROPERTY_CACHE_CLEANUP_INTERVAL")
                    .unwrap_or(property.cleanup_interval),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            image_cache: ImageCacheConfig::default(),
            property_cache: PropertyCacheConfig::default(),
        }
    }
}

/// Maps a configured entry bound to the cache's: 0 stays unbounded,
/// negative falls back to `DEFAULT_CAPACITY`.
pub fn normalize_capacity(raw: i64) -> usize {
    if raw < 0 {
        DEFAULT_CAPACITY
    } else {
        usize::try_from(raw).unwrap_or(usize::MAX)
    }
}

/// Maps a configured byte bound: 0 stays unbounded, negative falls back to
/// `DEFAULT_MAX_SIZE_BYTES`.
pub fn normalize_max_bytes(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or(DEFAULT_MAX_SIZE_BYTES)
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_secs(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_secs)
}

fn env_bool(name: &str) -> Option<bool> {
    let value = env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
