//! Upstream HTTP client abstraction
//!
//! The proxy talks to upstream only through [`UpstreamClient`], so tests can
//! swap in fakes that count calls.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use crate::error::Result;

/// What upstream sent back.
///
/// For non-success statuses `body` holds whatever error text could be read,
/// possibly nothing.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Error body as text, `None` when empty.
    pub fn body_text(&self) -> Option<String> {
        if self.body.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.body).into_owned())
        }
    }
}

/// Trait for upstream GET requests.
///
/// Implementations return `Err` only for transport failures; any HTTP status
/// is a successful round trip.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<UpstreamResponse>;
}

// == Reqwest Client ==
/// Real upstream client using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestUpstream {
    client: Client,
}

impl ReqwestUpstream {
    /// Creates a client with an overall per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstream {
    async fn get(&self, url: &str) -> Result<UpstreamResponse> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            // The status is what matters; a body that cannot be read is dropped.
            let text = response.text().await.unwrap_or_default();
            debug!(url = %url, status = status.as_u16(), "Upstream returned error status");
            return Ok(UpstreamResponse {
                status: status.as_u16(),
                content_type,
                body: Bytes::from(text),
            });
        }

        let body = response.bytes().await?;
        debug!(url = %url, size = body.len(), "Fetched upstream payload");

        Ok(UpstreamResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}
