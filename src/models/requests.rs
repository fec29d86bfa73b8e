//! Request DTOs for the proxy API
//!
//! Defines the shape of incoming query strings.

use url::form_urlencoded;

/// Raw query parameters of an export request, in arrival order.
///
/// Nothing here is trusted: the sanitizer decides what reaches upstream.
/// Repeated names are kept; lookups see the first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportParams {
    pairs: Vec<(String, String)>,
}

impl ExportParams {
    /// Parses a raw `application/x-www-form-urlencoded` query string.
    pub fn from_query(raw: Option<&str>) -> Self {
        let pairs = raw
            .map(|qs| {
                form_urlencoded::parse(qs.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    /// Builds params from already-decoded name/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of the first parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
