//! Error types for the request-serving tier
//!
//! Provides the unified error taxonomy using thiserror. Every failure that is
//! surfaced to a caller maps onto one of these variants; anything else is a bug.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Tier Error Enum ==
/// Unified error type for the request-serving tier.
///
/// Cache misses are deliberately absent: a miss is a normal outcome that falls
/// through to the router, never an error.
#[derive(Error, Debug)]
pub enum TierError {
    /// Rate limit exceeded for a client identity (retryable after the window)
    #[error("Rate limit exceeded for client: {0}")]
    AdmissionRejected(String),

    /// Circuit breaker is open for a backend dependency (fails fast)
    #[error("Circuit open for backend: {0}")]
    CircuitOpen(String),

    /// Every configured backend target is unhealthy
    #[error("No healthy backend available")]
    NoHealthyBackend,

    /// An individual backend call exceeded its timeout
    #[error("Backend timed out: {0}")]
    BackendTimeout(String),

    /// An individual backend call failed
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Unknown job id on the asynchronous path
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// A priority lane is at its configured depth
    #[error("Job queue full: {0}")]
    QueueFull(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error (treated as a bug, not an expected runtime state)
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for TierError {
    fn into_response(self) -> Response {
        let status = match &self {
            TierError::AdmissionRejected(_) => StatusCode::TOO_MANY_REQUESTS,
            TierError::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
            TierError::NoHealthyBackend => StatusCode::SERVICE_UNAVAILABLE,
            TierError::BackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            TierError::BackendError(_) => StatusCode::BAD_GATEWAY,
            TierError::JobNotFound(_) => StatusCode::NOT_FOUND,
            TierError::QueueFull(_) => StatusCode::SERVICE_UNAVAILABLE,
            TierError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TierError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the tier.
pub type Result<T> = std::result::Result<T, TierError>;
