//! Response DTOs for the listing API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{ImageCacheStats, PropertyCacheStats};
use crate::models::Property;

/// Response body for GET /properties/search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub limit: usize,
    pub count: usize,
    pub results: Vec<Property>,
}

impl SearchResponse {
    pub fn new(query: impl Into<String>, limit: usize, results: Vec<Property>) -> Self {
        Self {
            query: query.into(),
            limit,
            count: results.len(),
            results,
        }
    }
}

/// Response body for DELETE /properties/:id
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The listing that was deleted
    pub id: String,
}

impl DeleteResponse {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Property '{}' deleted successfully", id),
            id,
        }
    }
}

/// Response body for the cache diagnostics endpoint (GET /cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub images: ImageCacheStats,
    pub properties: PropertyCacheStats,
}

/// Response body for the cache invalidation endpoints
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    /// The entity whose cached entries were dropped
    pub id: String,
    /// Number of cache entries removed
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(kind: &str, id: impl Into<String>, removed: usize) -> Self {
        let id = id.into();
        Self {
            message: format!("Invalidated {} cache entries for {} '{}'", removed, kind, id),
            id,
            removed,
        }
    }
}

/// Response body for POST /cache/clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

impl ClearResponse {
    pub fn new() -> Self {
        Self {
            message: "All caches cleared".to_string(),
        }
    }
}

impl Default for ClearResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
