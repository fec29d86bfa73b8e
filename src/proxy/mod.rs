//! Proxy Module
//!
//! The caching proxy core: query sanitizing, upstream access, time-list
//! normalization and the orchestration tying them to the cache.

pub mod sanitizer;
pub mod service;
pub mod times;
pub mod upstream;

use axum::body::Bytes;

use crate::cache::CacheValue;
use crate::models::TimesResponse;

pub use sanitizer::{build_export_url, SanitizedExportRequest};
pub use service::{CacheStatus, Cached, ExportImage, MapProxy};
pub use times::normalize_times;
pub use upstream::{ReqwestUpstream, UpstreamClient, UpstreamResponse};

/// What the proxy keeps in its cache.
///
/// Image entries are keyed by canonical upstream URL, time lists by
/// `times:`-prefixed metadata URL.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedResponse {
    Image { body: Bytes, content_type: String },
    Times(TimesResponse),
}

impl CacheValue for CachedResponse {
    fn weight(&self) -> usize {
        match self {
            CachedResponse::Image { body, content_type } => body.len() + content_type.len(),
            CachedResponse::Times(times) => {
                times.source.len()
                    + times.fetched_at.len()
                    + times.times.iter().map(String::len).sum::<usize>()
            }
        }
    }
}
