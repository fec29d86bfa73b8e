//! API Module
//!
//! HTTP handlers and routing for the proxy.
//!
//! # Endpoints
//! - `GET /api/mrms/export` - Proxied, cached image export
//! - `GET /api/mrms/times` - Normalized list of available time-steps
//! - `GET /api/mrms/stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, API_MOUNT};
