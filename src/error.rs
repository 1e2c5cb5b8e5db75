//! Error types for the listing service
//!
//! Provides unified error handling using thiserror. The cache layer itself
//! never fails; these errors come from the repository, request validation and
//! the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == App Error Enum ==
/// Unified error type for the listing service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    /// No listing with the requested id
    #[error("Property not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the listing service.
pub type Result<T> = std::result::Result<T, AppError>;
