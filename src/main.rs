//! Listing Cache - property listing service with an in-process caching engine
//!
//! Serves listings, search and statistics through `PropertyCache` and exposes
//! image/property cache diagnostics over HTTP.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use listing_cache::api::{create_router, AppState};
use listing_cache::config::Config;

/// Main entry point for the listing service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the image and property caches
/// 4. Start the per-cache expiry sweeps
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM, stop accepting requests, then stop the sweeps
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "listing_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting listing service");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        image_cache_enabled = config.image_cache.enabled,
        image_capacity = config.image_cache.capacity,
        image_max_bytes = config.image_cache.max_size_bytes,
        property_cache_enabled = config.property_cache.enabled,
        property_capacity = config.property_cache.capacity,
        property_max_bytes = config.property_cache.max_size_bytes,
        "Configuration loaded"
    );

    let state = AppState::from_config(&config);

    let cleanup_handles: Vec<_> = [
        state.image_cache.spawn_cleanup(),
        state.property_cache.spawn_cleanup(),
    ]
    .into_iter()
    .flatten()
    .collect();
    info!("{} cache cleanup task(s) started", cleanup_handles.len());

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    for handle in cleanup_handles {
        handle.shutdown().await;
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
