//! Domain records and request/response models for the listing API
//!
//! This module defines the listing payloads plus the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod property;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use property::{Property, PropertyStatistics};
pub use requests::{PropertyRequest, SearchParams};
pub use responses::{
    CacheStatsResponse, ClearResponse, DeleteResponse, ErrorResponse, HealthResponse,
    InvalidateResponse, SearchResponse,
};
