//! Proxy Service
//!
//! Orchestrates the export and times operations: sanitize, look up the cache,
//! fetch upstream on a miss, normalize, store, answer.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use chrono::Utc;
use tracing::{debug, error, warn};

use crate::cache::SharedCache;
use crate::config::Config;
use crate::error::{ProxyError, Result};
use crate::models::{ExportParams, TimesResponse};
use crate::proxy::sanitizer::SanitizedExportRequest;
use crate::proxy::times::{normalize_times, to_iso};
use crate::proxy::upstream::UpstreamClient;
use crate::proxy::CachedResponse;

/// Content type assumed when upstream does not declare one.
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/png";

/// Key namespace for time-list entries.
pub const TIMES_KEY_PREFIX: &str = "times:";

/// Whether a response came out of the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    /// Value for the `X-Cache` response header.
    pub fn as_header_value(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// A proxied value together with its cache status.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub status: CacheStatus,
}

/// Image payload returned by the export operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportImage {
    pub body: Bytes,
    pub content_type: String,
}

// == Map Proxy ==
/// The caching proxy in front of one upstream export service.
pub struct MapProxy {
    export_base: Option<String>,
    metadata_url: Option<String>,
    image_ttl: Duration,
    times_ttl: Duration,
    cache: SharedCache<CachedResponse>,
    upstream: Arc<dyn UpstreamClient>,
}

impl MapProxy {
    /// Creates a proxy over an existing cache and upstream client.
    pub fn new(
        config: &Config,
        cache: SharedCache<CachedResponse>,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            export_base: config.upstream_export_base.clone(),
            metadata_url: config.metadata_url(),
            image_ttl: config.image_ttl(),
            times_ttl: config.times_ttl(),
            cache,
            upstream,
        }
    }

    pub fn cache(&self) -> &SharedCache<CachedResponse> {
        &self.cache
    }

    // == Export ==
    /// Returns the image for a client export query.
    ///
    /// # Errors
    /// - `Configuration` if no export base is configured; nothing is fetched
    /// - `Upstream` with the upstream status and best-effort body text
    /// - `Transport` if upstream cannot be reached or read
    pub async fn export(&self, params: &ExportParams) -> Result<Cached<ExportImage>> {
        let base = self.export_base.as_deref().ok_or_else(|| {
            ProxyError::Configuration("Upstream export base not configured".to_string())
        })?;

        let key = SanitizedExportRequest::from_params(params).to_url(base);

        let cached = self.cache.write().await.get(&key);
        if let Some(CachedResponse::Image { body, content_type }) = cached {
            debug!(key = %key, "Export cache hit");
            return Ok(Cached {
                value: ExportImage { body, content_type },
                status: CacheStatus::Hit,
            });
        }
        debug!(key = %key, "Export cache miss");

        let response = self.upstream.get(&key).await.map_err(|e| {
            error!(url = %key, error = %e, "Export fetch failed");
            e
        })?;

        if !response.is_success() {
            warn!(url = %key, status = response.status, "Upstream export failed");
            return Err(ProxyError::Upstream {
                message: "Upstream failed".to_string(),
                status: response.status,
                body: Some(response.body_text().unwrap_or_default()),
            });
        }

        let content_type = response
            .content_type
            .unwrap_or_else(|| DEFAULT_IMAGE_CONTENT_TYPE.to_string());
        let image = ExportImage {
            body: response.body,
            content_type,
        };

        self.store(
            key,
            CachedResponse::Image {
                body: image.body.clone(),
                content_type: image.content_type.clone(),
            },
            self.image_ttl,
        )
        .await;

        Ok(Cached {
            value: image,
            status: CacheStatus::Miss,
        })
    }

    // == Times ==
    /// Returns the normalized list of available time-steps.
    ///
    /// # Errors
    /// - `Configuration` if no metadata URL can be derived
    /// - `Upstream` with the upstream status
    /// - `Transport` if upstream cannot be reached or its body is not JSON
    pub async fn times(&self) -> Result<Cached<TimesResponse>> {
        let source = self.metadata_url.as_deref().ok_or_else(|| {
            ProxyError::Configuration("Upstream metadata URL not configured".to_string())
        })?;

        let key = format!("{}{}", TIMES_KEY_PREFIX, source);

        let cached = self.cache.write().await.get(&key);
        if let Some(CachedResponse::Times(times)) = cached {
            debug!(key = %key, "Times cache hit");
            return Ok(Cached {
                value: times,
                status: CacheStatus::Hit,
            });
        }
        debug!(key = %key, "Times cache miss");

        let response = self.upstream.get(source).await.map_err(|e| {
            error!(url = %source, error = %e, "Metadata fetch failed");
            e
        })?;

        if !response.is_success() {
            warn!(url = %source, status = response.status, "Upstream metadata failed");
            return Err(ProxyError::Upstream {
                message: "Failed to reach image server".to_string(),
                status: response.status,
                body: None,
            });
        }

        let doc: serde_json::Value = serde_json::from_slice(&response.body).map_err(|e| {
            error!(url = %source, error = %e, "Metadata is not JSON");
            ProxyError::Transport(format!("Invalid metadata document: {}", e))
        })?;

        let now = Utc::now();
        let times = TimesResponse {
            source: source.to_string(),
            fetched_at: to_iso(now),
            times: normalize_times(&doc, now),
        };

        self.store(key, CachedResponse::Times(times.clone()), self.times_ttl)
            .await;

        Ok(Cached {
            value: times,
            status: CacheStatus::Miss,
        })
    }

    /// Inserts into the cache; a rejected insert is logged and ignored.
    async fn store(&self, key: String, value: CachedResponse, ttl: Duration) {
        let result = self.cache.write().await.set(key, value, Some(ttl));
        if let Err(e) = result {
            warn!(error = %e, "Failed to cache upstream response");
        }
    }
}
