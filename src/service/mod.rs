//! Listing service layer
//!
//! The repository collaborator and the service that fronts it with
//! `PropertyCache`.

pub mod property_service;
pub mod repository;

pub use property_service::PropertyService;
pub use repository::{InMemoryPropertyRepository, PropertyRepository};
