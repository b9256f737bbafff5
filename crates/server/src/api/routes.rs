use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::{batches, downloads, handlers, middleware::metrics_middleware, orchestrator, playlists};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config().server.static_dir.clone();

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Playlists
        .route("/playlists/resolve", post(playlists::resolve_playlist))
        // Batches
        .route("/batches", post(batches::submit_batch))
        .route("/batches/{id}", get(batches::get_progress))
        .route("/batches/{id}/archive", get(batches::download_archive))
        // Single downloads
        .route("/downloads/single", post(downloads::download_single))
        // Orchestrator
        .route("/orchestrator/status", get(orchestrator::get_status));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .with_state(state);

    // Serve the web UI with SPA fallback when configured
    let router = match static_dir {
        Some(dir) => {
            let index_path = dir.join("index.html");
            router.fallback_service(ServeDir::new(&dir).fallback(ServeFile::new(index_path)))
        }
        None => router,
    };

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
