//! MRMS Proxy - A caching reverse proxy for a map image export service
//!
//! Sanitizes export queries, forwards them to a single fixed upstream and
//! caches images and time-step lists with TTL expiration and LRU eviction.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod proxy;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::ProxyError;
pub use proxy::MapProxy;
pub use tasks::spawn_cleanup_task;
