//! Error types for the callback service
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Callback Error Enum ==
/// Unified error type for the callback service.
#[derive(Error, Debug)]
pub enum CallbackError {
    /// Request body could not be parsed as a callback batch
    #[error("Invalid JSON: provided input cannot be parsed")]
    InvalidJson,

    /// Batch refused before any resolution was launched
    #[error("Batch rejected: {0}")]
    Rejected(String),

    /// Oracle did not answer within the per-call timeout
    #[error("Oracle timed out resolving object {0}")]
    OracleTimeout(i64),

    /// Oracle request could not be sent or completed
    #[error("Oracle request failed for object {id}: {reason}")]
    OracleTransport { id: i64, reason: String },

    /// Oracle answered with a non-success status
    #[error("Oracle returned status {status} for object {id}")]
    OracleStatus { id: i64, status: u16 },

    /// Oracle body was not a valid status document
    #[error("Oracle response for object {id} cannot be parsed: {reason}")]
    OracleDecode { id: i64, reason: String },

    /// Record store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CallbackError {
    /// Public error code reported in the `error` field of a response body.
    pub fn code(&self) -> &'static str {
        match self {
            CallbackError::InvalidJson => "invalid_json",
            CallbackError::Rejected(_) => "not_acceptable",
            CallbackError::OracleTimeout(_)
            | CallbackError::OracleTransport { .. }
            | CallbackError::OracleStatus { .. }
            | CallbackError::OracleDecode { .. } => "oracle_unavailable",
            CallbackError::Store(_) => "store_error",
            CallbackError::Internal(_) => "internal_error",
        }
    }

    /// Human readable detail reported in the `message` field.
    pub fn detail(&self) -> String {
        match self {
            CallbackError::InvalidJson => "provided input cannot be parsed".to_string(),
            CallbackError::Rejected(msg)
            | CallbackError::Store(msg)
            | CallbackError::Internal(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Whether retrying the oracle call may succeed.
    ///
    /// Timeouts, transport failures, 429 and 5xx answers are transient.
    /// Malformed bodies and other 4xx answers will not change on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            CallbackError::OracleTimeout(_) | CallbackError::OracleTransport { .. } => true,
            CallbackError::OracleStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            CallbackError::InvalidJson => StatusCode::BAD_REQUEST,
            CallbackError::Rejected(_) => StatusCode::NOT_ACCEPTABLE,
            CallbackError::OracleTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            CallbackError::OracleTransport { .. }
            | CallbackError::OracleStatus { .. }
            | CallbackError::OracleDecode { .. } => StatusCode::BAD_GATEWAY,
            CallbackError::Store(_) | CallbackError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse::new(self.code(), self.detail()));

        (self.status(), body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the callback service.
pub type Result<T> = std::result::Result<T, CallbackError>;
