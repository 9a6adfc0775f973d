//! Error types for the field cache
//!
//! Cache-layer failures never reach `get_field` callers; these types only
//! surface at the edges (record stores and the HTTP host surface).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::cache::ParseEntityIdError;
use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Error type for requests made against the host surface.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Entity identifier could not be parsed
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    /// Entity is not known to the host
    #[error("Entity not found: {0}")]
    UnknownEntity(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ParseEntityIdError> for CacheError {
    fn from(err: ParseEntityIdError) -> Self {
        CacheError::InvalidEntity(err.0)
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::InvalidEntity(_) => StatusCode::BAD_REQUEST,
            CacheError::UnknownEntity(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Store Error Enum ==
/// Failure reported by a durable record store.
///
/// The durable backend logs these once and degrades to "absent"; they
/// are never retried.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or refused the operation
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// A record could not be encoded, or a stored record is malformed
    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the host surface.
pub type Result<T> = std::result::Result<T, CacheError>;
