//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::time::Duration;

/// Path segment of the export endpoint that is swapped out to reach the
/// service metadata document.
const EXPORT_SEGMENT: &str = "/MapServer/export";

/// Replacement for [`EXPORT_SEGMENT`] when deriving the metadata URL.
const METADATA_SEGMENT: &str = "/ImageServer?f=json";

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream image export endpoint (required for any proxying)
    pub upstream_export_base: Option<String>,
    /// Explicit upstream metadata endpoint, derived from the export base if unset
    pub upstream_metadata_url: Option<String>,
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Default TTL in milliseconds, applied to image responses
    pub default_ttl_ms: u64,
    /// TTL in milliseconds for time-list responses
    pub times_ttl_ms: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Upstream request timeout in seconds
    pub upstream_timeout_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `UPSTREAM_EXPORT_BASE` - Image export endpoint (no default)
    /// - `UPSTREAM_METADATA_URL` - Metadata endpoint override (no default)
    /// - `PORT` - HTTP server port (default: 8787)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 500)
    /// - `CACHE_TTL_MS` - Image TTL in milliseconds (default: 120000)
    /// - `TIMES_TTL_MS` - Time-list TTL in milliseconds (default: 30000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 10)
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream request timeout (default: 30)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Self {
            upstream_export_base: non_empty("UPSTREAM_EXPORT_BASE"),
            upstream_metadata_url: non_empty("UPSTREAM_METADATA_URL"),
            server_port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
            max_entries: lookup("CACHE_MAX_ENTRIES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            default_ttl_ms: lookup("CACHE_TTL_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_ttl_ms),
            times_ttl_ms: lookup("TIMES_TTL_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.times_ttl_ms),
            cleanup_interval: lookup("CLEANUP_INTERVAL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval),
            upstream_timeout_secs: lookup("UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.upstream_timeout_secs),
        }
    }

    /// Sets the upstream export base, builder style.
    pub fn with_export_base(mut self, base: impl Into<String>) -> Self {
        self.upstream_export_base = Some(base.into());
        self
    }

    // == Metadata URL ==
    /// Resolves the metadata document URL.
    ///
    /// The explicit override wins; otherwise the export base has its
    /// `/MapServer/export` segment replaced by `/ImageServer?f=json`.
    /// A base without that segment is returned unchanged.
    pub fn metadata_url(&self) -> Option<String> {
        if let Some(url) = &self.upstream_metadata_url {
            return Some(url.clone());
        }
        self.upstream_export_base
            .as_ref()
            .map(|base| base.replacen(EXPORT_SEGMENT, METADATA_SEGMENT, 1))
    }

    /// Default TTL for image entries.
    pub fn image_ttl(&self) -> Duration {
        Duration::from_millis(self.default_ttl_ms)
    }

    /// TTL for time-list entries.
    pub fn times_ttl(&self) -> Duration {
        Duration::from_millis(self.times_ttl_ms)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_export_base: None,
            upstream_metadata_url: None,
            server_port: 8787,
            max_entries: 500,
            default_ttl_ms: 120_000,
            times_ttl_ms: 30_000,
            cleanup_interval: 10,
            upstream_timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.upstream_export_base.is_none());
        assert!(config.upstream_metadata_url.is_none());
        assert_eq!(config.server_port, 8787);
        assert_eq!(config.max_entries, 500);
        assert_eq!(config.default_ttl_ms, 120_000);
        assert_eq!(config.times_ttl_ms, 30_000);
        assert_eq!(config.upstream_timeout_secs, 30);
    }

    #[test]
    fn test_config_from_empty_lookup_uses_defaults() {
        let config = Config::from_lookup(|_| None);
        assert!(config.upstream_export_base.is_none());
        assert_eq!(config.max_entries, 500);
        assert_eq!(config.image_ttl(), Duration::from_secs(120));
        assert_eq!(config.times_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_from_lookup_reads_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("UPSTREAM_EXPORT_BASE", "https://maps.example.com/rest/MapServer/export"),
            ("PORT", "9000"),
            ("CACHE_MAX_ENTRIES", "42"),
            ("CACHE_TTL_MS", "5000"),
        ]));

        assert_eq!(
            config.upstream_export_base.as_deref(),
            Some("https://maps.example.com/rest/MapServer/export")
        );
        assert_eq!(config.server_port, 9000);
        assert_eq!(config.max_entries, 42);
        assert_eq!(config.default_ttl_ms, 5000);
    }

    #[test]
    fn test_config_invalid_numbers_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("CACHE_MAX_ENTRIES", "-3"),
        ]));
        assert_eq!(config.server_port, 8787);
        assert_eq!(config.max_entries, 500);
    }

    #[test]
    fn test_config_blank_urls_are_absent() {
        let config = Config::from_lookup(lookup_from(&[
            ("UPSTREAM_EXPORT_BASE", "  "),
            ("UPSTREAM_METADATA_URL", ""),
        ]));
        assert!(config.upstream_export_base.is_none());
        assert!(config.metadata_url().is_none());
    }

    #[test]
    fn test_metadata_url_derived_from_export_base() {
        let config = Config::default()
            .with_export_base("https://maps.example.com/arcgis/rest/services/radar/MapServer/export");
        assert_eq!(
            config.metadata_url().as_deref(),
            Some("https://maps.example.com/arcgis/rest/services/radar/ImageServer?f=json")
        );
    }

    #[test]
    fn test_metadata_url_override_wins() {
        let mut config = Config::default().with_export_base("https://a.example.com/MapServer/export");
        config.upstream_metadata_url = Some("https://b.example.com/meta".to_string());
        assert_eq!(config.metadata_url().as_deref(), Some("https://b.example.com/meta"));
    }

    #[test]
    fn test_metadata_url_without_export_segment_is_unchanged() {
        let config = Config::default().with_export_base("https://a.example.com/export");
        assert_eq!(config.metadata_url().as_deref(), Some("https://a.example.com/export"));
    }
}
