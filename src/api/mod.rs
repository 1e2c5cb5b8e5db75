//! API Module
//!
//! HTTP handlers and routing for the listing service REST API.
//!
//! # Endpoints
//! - `/properties` - Listing CRUD, search and statistics, served through
//!   `PropertyCache`
//! - `/cache` - Cache statistics, invalidation and clearing
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
