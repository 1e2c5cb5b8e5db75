//! API Routes
//!
//! Configures the Axum router with the listing and cache endpoints.

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, clear_cache_handler, create_property_handler, delete_property_handler,
    get_property_handler, health_handler, invalidate_image_handler, invalidate_property_handler,
    search_handler, statistics_handler, update_property_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `POST /properties` - Create a listing
/// - `GET|PUT|DELETE /properties/:id` - Read, replace or delete a listing
/// - `GET /properties/search?q=&limit=` - Ranked search
/// - `GET /properties/statistics` - Aggregate statistics
/// - `GET /cache/stats` - Image and property cache statistics
/// - `DELETE /cache/images/:id` - Drop every cached image of a listing
/// - `DELETE /cache/properties/:id` - Drop a cached listing
/// - `POST /cache/clear` - Empty both caches
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/properties", post(create_property_handler))
        .route("/properties/search", get(search_handler))
        .route("/properties/statistics", get(statistics_handler))
        .route(
            "/properties/:id",
            get(get_property_handler)
                .put(update_property_handler)
                .delete(delete_property_handler),
        )
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache/images/:id", delete(invalidate_image_handler))
        .route("/cache/properties/:id", delete(invalidate_property_handler))
        .route("/cache/clear", post(clear_cache_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        create_router(AppState::from_config(&Config::default()))
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(status_of(create_test_app(), "GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cache_stats_endpoint() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/cache/stats").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_static_paths_win_over_id() {
        let app = create_test_app();
        assert_eq!(
            status_of(app.clone(), "GET", "/properties/statistics").await,
            StatusCode::OK
        );
        assert_eq!(
            status_of(app, "GET", "/properties/search?q=loft").await,
            StatusCode::OK
        );
    }

    #[tokio::test]
    async fn test_create_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/properties")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title":"Loft","price":1200,"city":"Lyon"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        assert_eq!(
            status_of(create_test_app(), "GET", "/properties/nonexistent").await,
            StatusCode::NOT_FOUND
        );
    }
}
