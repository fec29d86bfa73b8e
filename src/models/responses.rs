//! Response DTOs for the proxy API
//!
//! Defines the structure of outgoing JSON response bodies.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;

/// Response body for GET /times
///
/// Also the record kept in the cache for time-list lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesResponse {
    /// Metadata URL the list was derived from
    pub source: String,
    /// When the upstream fetch completed (ISO-8601)
    pub fetched_at: String,
    /// Available time-steps, most recent first (ISO-8601)
    pub times: Vec<String>,
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub total_entries: usize,
    pub max_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl CacheStatsResponse {
    pub fn new(stats: &CacheStats, max_entries: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            max_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    /// Current Unix timestamp in milliseconds
    pub ts: i64,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            ok: true,
            ts: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Error response body for all error conditions
///
/// `status` and `body` are only present for upstream failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: None,
            body: None,
        }
    }

    /// Error body for a non-success upstream answer.
    pub fn upstream(error: impl Into<String>, status: u16, body: Option<String>) -> Self {
        Self {
            error: error.into(),
            status: Some(status),
            body,
        }
    }
}
