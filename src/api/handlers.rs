//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::RwLock;

use crate::cache::{CacheStore, SharedCache};
use crate::config::Config;
use crate::error::Result;
use crate::models::{CacheStatsResponse, ErrorResponse, ExportParams, HealthResponse};
use crate::proxy::{CachedResponse, MapProxy, ReqwestUpstream, UpstreamClient};

/// Header telling clients whether the answer came from the cache.
pub const X_CACHE: &str = "x-cache";

/// Client-side caching hint attached to every image response.
pub const EXPORT_CACHE_CONTROL: &str = "public, max-age=60";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<MapProxy>,
}

impl AppState {
    pub fn new(proxy: MapProxy) -> Self {
        Self {
            proxy: Arc::new(proxy),
        }
    }

    /// Creates an AppState from configuration.
    ///
    /// Builds the cache with the configured capacity and image TTL, and a
    /// reqwest upstream client with the configured timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let upstream: Arc<dyn UpstreamClient> =
            Arc::new(ReqwestUpstream::new(config.upstream_timeout())?);
        Ok(Self::with_upstream(config, upstream))
    }

    /// Creates an AppState around a given upstream client.
    pub fn with_upstream(config: &Config, upstream: Arc<dyn UpstreamClient>) -> Self {
        let store = CacheStore::new(config.max_entries, config.image_ttl());
        let cache = Arc::new(RwLock::new(store));
        Self::new(MapProxy::new(config, cache, upstream))
    }

    pub fn cache(&self) -> SharedCache<CachedResponse> {
        self.proxy.cache().clone()
    }
}

/// Handler for GET /export
///
/// Proxies an image export; the raw query string is sanitized before it
/// gets anywhere near upstream.
pub async fn export_handler(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response> {
    let params = ExportParams::from_query(query.as_deref());
    let image = state.proxy.export(&params).await?;

    let headers = [
        (header::CONTENT_TYPE, image.value.content_type),
        (header::CACHE_CONTROL, EXPORT_CACHE_CONTROL.to_string()),
        (
            HeaderName::from_static(X_CACHE),
            image.status.as_header_value().to_string(),
        ),
    ];
    Ok((headers, image.value.body).into_response())
}

/// Handler for GET /times
pub async fn times_handler(State(state): State<AppState>) -> Result<Response> {
    let times = state.proxy.times().await?;

    let headers = [(HeaderName::from_static(X_CACHE), times.status.as_header_value())];
    Ok((headers, Json(times.value)).into_response())
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    let cache = state.proxy.cache().read().await;
    let response = CacheStatsResponse::new(&cache.stats(), cache.max_entries());
    Json(response)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Fallback for unknown routes.
pub async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found")))
}
