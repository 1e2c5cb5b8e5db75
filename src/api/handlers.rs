//! API Handlers
//!
//! HTTP request handlers for the listing endpoints and the cache
//! diagnostics/invalidation endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::cache::{ImageCache, PropertyCache};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    CacheStatsResponse, ClearResponse, DeleteResponse, HealthResponse, InvalidateResponse,
    Property, PropertyRequest, PropertyStatistics, SearchParams, SearchResponse,
};
use crate::service::{InMemoryPropertyRepository, PropertyRepository, PropertyService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub properties: Arc<PropertyService>,
    pub property_cache: Arc<PropertyCache>,
    pub image_cache: Arc<ImageCache>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn PropertyRepository>,
        property_cache: PropertyCache,
        image_cache: ImageCache,
    ) -> Self {
        let property_cache = Arc::new(property_cache);
        Self {
            properties: Arc::new(PropertyService::new(
                repository,
                Arc::clone(&property_cache),
            )),
            property_cache,
            image_cache: Arc::new(image_cache),
        }
    }

    /// Builds both caches from configuration over an empty in-memory
    /// repository.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(InMemoryPropertyRepository::new()),
            PropertyCache::new(config.property_cache.clone()),
            ImageCache::new(config.image_cache.clone()),
        )
    }
}

fn validated(req: PropertyRequest) -> Result<PropertyRequest> {
    match req.validate() {
        Some(error_msg) => Err(AppError::InvalidRequest(error_msg)),
        None => Ok(req),
    }
}

// == Listings ==
/// Handler for GET /properties/:id
pub async fn get_property_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Property>> {
    state.properties.get_property(&id).map(Json)
}

/// Handler for POST /properties
pub async fn create_property_handler(
    State(state): State<AppState>,
    Json(req): Json<PropertyRequest>,
) -> Result<(StatusCode, Json<Property>)> {
    let property = state.properties.create(validated(req)?)?;
    Ok((StatusCode::CREATED, Json(property)))
}

/// Handler for PUT /properties/:id
pub async fn update_property_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PropertyRequest>,
) -> Result<Json<Property>> {
    state.properties.update(&id, validated(req)?).map(Json)
}

/// Handler for DELETE /properties/:id
///
/// Also drops every cached image derived from the listing.
pub async fn delete_property_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    state.properties.delete(&id)?;
    state.image_cache.invalidate_image(&id);

    Ok(Json(DeleteResponse::new(id)))
}

/// Handler for GET /properties/search?q=&limit=
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    let limit = params.effective_limit();
    let results = state.properties.search(&params.q, limit)?;

    Ok(Json(SearchResponse::new(params.q, limit, results)))
}

/// Handler for GET /properties/statistics
pub async fn statistics_handler(
    State(state): State<AppState>,
) -> Result<Json<PropertyStatistics>> {
    state.properties.statistics().map(Json)
}

// == Cache Diagnostics ==
/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        images: state.image_cache.stats(),
        properties: state.property_cache.stats(),
    })
}

/// Handler for DELETE /cache/images/:id
pub async fn invalidate_image_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.image_cache.invalidate_image(&id);
    Json(InvalidateResponse::new("image", id, removed))
}

/// Handler for DELETE /cache/properties/:id
pub async fn invalidate_property_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = usize::from(state.property_cache.invalidate_property(&id));
    Json(InvalidateResponse::new("property", id, removed))
}

/// Handler for POST /cache/clear
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    state.image_cache.clear();
    state.property_cache.clear_cache();
    info!("All caches cleared");

    Json(ClearResponse::new())
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
