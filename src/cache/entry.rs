//! Cache Entry Module
//!
//! Defines a single cached unit: key, payload, accounted size and expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A cached key/value unit with size and expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// Key under which the entry is indexed
    pub key: String,
    /// The stored payload
    pub value: V,
    /// Weight of the value counted against the byte bound
    pub size_bytes: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` from now.
    ///
    /// A zero `ttl` means the entry never expires.
    pub fn new(key: String, value: V, size_bytes: u64, ttl: Duration) -> Self {
        Self {
            key,
            value,
            size_bytes,
            expires_at: expiry_from(current_timestamp_ms(), ttl),
        }
    }

    // == Refresh ==
    /// Replaces the payload and restarts the TTL clock.
    ///
    /// Returns the previous accounted size so the caller can adjust its totals.
    pub fn refresh(&mut self, value: V, size_bytes: u64, ttl: Duration) -> u64 {
        let old_size = self.size_bytes;
        self.value = value;
        self.size_bytes = size_bytes;
        self.expires_at = expiry_from(current_timestamp_ms(), ttl);
        old_size
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Checks expiry against an explicit Unix millisecond timestamp.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }
}

fn expiry_from(now_ms: u64, ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        None
    } else {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Some(now_ms.saturating_add(ttl_ms.max(1)))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as zero rather than panicking.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
