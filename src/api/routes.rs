//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    export_handler, health_handler, not_found_handler, stats_handler, times_handler, AppState,
};

/// Path the proxy endpoints are nested under.
pub const API_MOUNT: &str = "/api/mrms";

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/mrms/export` - Proxied image export
/// - `GET /api/mrms/times` - Available time-steps
/// - `GET /api/mrms/stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// Anything else answers 404 with a JSON error body.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/export", get(export_handler))
        .route("/times", get(times_handler))
        .route("/stats", get(stats_handler))
        .layer(cors);

    Router::new()
        .nest(API_MOUNT, api)
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
