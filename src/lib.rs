//! Listing Cache - property listing service with an in-process caching engine
//!
//! Provides a count- and byte-bounded LRU cache with TTL expiration, an image
//! cache with per-listing bulk invalidation, and a write-through property
//! cache for listings, search results and statistics.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_cleanup_task, CleanupHandle, Sweep};
