//! Unified error types for the snapshot gateway.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Startup-level error for the gateway binary.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Store construction or access error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by key-value store backends.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Transport-level failure talking to the store.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned status {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error text reported by the store.
        message: String,
    },

    /// A stored value or store response was not valid JSON.
    #[error("failed to decode store payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Store URL could not be built.
    #[error("invalid store url: {0}")]
    Url(#[from] url::ParseError),

    /// The store is unreachable or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced at the HTTP boundary.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The requested snapshot does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// The sync request did not satisfy the configured auth policy.
    #[error("Unauthorized")]
    Unauthorized,

    /// The sync body could not be parsed.
    #[error("invalid sync payload: {0}")]
    Payload(#[source] serde_json::Error),

    /// Any failure from the underlying store.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Payload(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;
