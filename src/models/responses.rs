//! Response DTOs for the callback service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::records::StatsSnapshot;

/// Response body for an accepted batch (POST /callback)
///
/// Serializes to `{}`: acceptance means resolution was launched, nothing more.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AcceptedResponse {}

/// Response body for the health endpoint (GET / and GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status ("ok" or the reason the service is degraded)
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a healthy response with current timestamp
    pub fn ok() -> Self {
        Self::with_status("ok")
    }

    /// Creates a response reporting an unreachable store
    pub fn store_unreachable() -> Self {
        Self::with_status("store unreachable")
    }

    fn with_status(status: &str) -> Self {
        Self {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Pipeline counters
    #[serde(flatten)]
    pub counters: StatsSnapshot,
    /// Expiration timers armed and not yet fired
    pub timers_pending: usize,
    /// Records currently stored
    pub records_stored: usize,
}

impl StatsResponse {
    pub fn new(counters: StatsSnapshot, timers_pending: usize, records_stored: usize) -> Self {
        Self {
            counters,
            timers_pending,
            records_stored,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Machine readable error code
    pub error: String,
    /// Detail describing what went wrong
    pub message: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
