//! Error types for vroom-sync
//!
//! Failure taxonomy:
//! - Classification misses are values (`None`), never errors
//! - Upstream transport/auth failures abort the whole pass
//! - Ordering violations and malformed criteria abort one view only
//! - A second concurrent pass is refused

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::criteria::CriteriaError;
use crate::services::upstream::UpstreamError;

/// Synchronization error
#[derive(Debug, Error)]
pub enum SyncError {
    /// Upstream request failed; fatal for the pass
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Upstream returned unknown-id records in an order that does not match the request
    #[error(
        "Ordering violation in view {view}: expected {expected} at unknown position {position}, upstream returned {found}"
    )]
    OrderingViolation {
        view: String,
        position: usize,
        expected: String,
        found: String,
    },

    /// Saved filter criteria could not be translated into a query
    #[error("Invalid criteria for view {view}: {source}")]
    Criteria {
        view: String,
        #[source]
        source: CriteriaError,
    },

    /// Another pass holds the state lock
    #[error("Synchronization pass already in progress")]
    PassInProgress,
}

impl SyncError {
    /// True for failures that abort only the affected view
    pub fn is_view_local(&self) -> bool {
        matches!(
            self,
            SyncError::OrderingViolation { .. } | SyncError::Criteria { .. }
        )
    }
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - a pass is already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream unavailable or misbehaving (502)
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::PassInProgress => ApiError::Conflict(err.to_string()),
            SyncError::Upstream(_) => ApiError::BadGateway(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<vroom_common::Error> for ApiError {
    fn from(err: vroom_common::Error) -> Self {
        match err {
            vroom_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
