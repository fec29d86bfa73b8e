//! Query Sanitizer
//!
//! Turns an untrusted export query into the canonical upstream URL. The URL
//! doubles as the image cache key, so output must be deterministic.

use url::form_urlencoded;

use crate::models::ExportParams;

/// Parameters a client may forward upstream, in canonical order.
pub const ALLOWED_PARAMS: [&str; 9] = [
    "bbox",
    "size",
    "time",
    "bboxSR",
    "imageSR",
    "format",
    "layers",
    "layerDefs",
    "dpi",
];

/// Parameters always overwritten regardless of client input.
pub const FORCED_PARAMS: [(&str, &str); 3] =
    [("format", "png32"), ("transparent", "true"), ("f", "image")];

/// Geographic coordinates (WGS 84).
pub const DEFAULT_BBOX_SR: &str = "4326";

/// Web Mercator.
pub const DEFAULT_IMAGE_SR: &str = "3857";

// == Sanitized Request ==
/// Allow-listed, forced and defaulted export parameters in canonical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizedExportRequest {
    params: Vec<(String, String)>,
}

impl SanitizedExportRequest {
    // == Sanitize ==
    /// Builds the canonical request from raw client parameters.
    ///
    /// Unknown names and empty values are dropped without error.
    pub fn from_params(raw: &ExportParams) -> Self {
        let mut request = Self { params: Vec::new() };

        for name in ALLOWED_PARAMS {
            if let Some(value) = raw.get(name).filter(|v| !v.is_empty()) {
                request.set(name, value);
            }
        }

        for (name, value) in FORCED_PARAMS {
            request.set(name, value);
        }

        if request.get("bboxSR").is_none() {
            request.set("bboxSR", DEFAULT_BBOX_SR);
        }
        if request.get("imageSR").is_none() {
            request.set("imageSR", DEFAULT_IMAGE_SR);
        }

        request
    }

    /// Replaces the value in place if present, otherwise appends.
    fn set(&mut self, name: &str, value: &str) {
        match self.params.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.params.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Form-encoded query string, without the leading `?`.
    pub fn query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    /// Full upstream URL; also the cache key for the image it names.
    pub fn to_url(&self, base: &str) -> String {
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{}{}{}", base, separator, self.query_string())
    }
}

/// Sanitizes `raw` and renders it against the upstream `base`.
pub fn build_export_url(base: &str, raw: &ExportParams) -> String {
    SanitizedExportRequest::from_params(raw).to_url(base)
}
