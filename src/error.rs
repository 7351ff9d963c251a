//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for every cache backend and the HTTP layer.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key contains characters outside `[A-Za-z0-9_-]` or is empty
    #[error("Invalid key '{0}'. Only [a-zA-Z0-9_-] allowed.")]
    InvalidKey(String),

    /// TTL is neither absent nor accepted by the TTL policy
    #[error("Invalid TTL {0}. TTL must only be integer greater than 0 or null.")]
    InvalidTtl(i64),

    /// Value is null or empty where the backend requires a payload
    #[error("Invalid value for key '{0}'. Value cannot be empty.")]
    InvalidValue(String),

    /// Multi-key operation received an unusable key collection
    #[error("Invalid batch input: {0}")]
    InvalidBatchInput(String),

    /// Underlying storage medium reported an error
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Key not found (HTTP layer only)
    #[error("Key not found: {0}")]
    NotFound(String),
}

impl CacheError {
    /// True for errors raised before any storage access.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CacheError::InvalidKey(_)
                | CacheError::InvalidTtl(_)
                | CacheError::InvalidValue(_)
                | CacheError::InvalidBatchInput(_)
        )
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Storage(format!("serialization: {}", err))
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            err if err.is_validation() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
