//! Error types for the proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Proxy Error Enum ==
/// Unified error type for the proxy.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProxyError {
    /// A required upstream URL is not configured
    #[error("{0}")]
    Configuration(String),

    /// Upstream answered with a non-success status
    #[error("{message} (status {status})")]
    Upstream {
        message: String,
        status: u16,
        body: Option<String>,
    },

    /// Upstream could not be reached or its payload could not be read
    #[error("Transport error: {0}")]
    Transport(String),

    /// Cache refused an insert
    #[error("Cache error: {0}")]
    Cache(String),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::Transport(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ProxyError::Configuration(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg))
            }
            ProxyError::Upstream {
                message,
                status,
                body,
            } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::upstream(message, status, body),
            ),
            ProxyError::Transport(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg))
            }
            ProxyError::Cache(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg)),
        };

        (status, Json(body)).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the proxy.
pub type Result<T> = std::result::Result<T, ProxyError>;
