//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and LRU eviction.

mod clock;
mod entry;
mod lru;
mod stats;
mod store;


use std::sync::Arc;

use tokio::sync::RwLock;

// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, CacheValue};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

/// Cache handle shared between request tasks and the cleanup task.
pub type SharedCache<V> = Arc<RwLock<CacheStore<V>>>;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 8 * 1024;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 16 * 1024 * 1024; // 16 MB
