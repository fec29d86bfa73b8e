//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

// == Cache Value ==
/// Anything the cache can hold.
///
/// `weight` is the approximate payload size in bytes, checked against
/// [`MAX_VALUE_SIZE`](crate::cache::MAX_VALUE_SIZE) on insert.
pub trait CacheValue: Clone + Send + Sync {
    fn weight(&self) -> usize;
}

impl CacheValue for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry inserted at `now_ms` that lives for `ttl`.
    pub fn new(value: V, now_ms: u64, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: now_ms.saturating_add(ttl.as_millis() as u64),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time reaches its expiration
    /// time, so an entry with a zero TTL is never observable.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}
