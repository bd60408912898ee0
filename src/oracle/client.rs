//! Status Oracle Client
//!
//! Resolves one object identifier to its reachability by calling
//! `GET {base}/objects/{id}` on the external status oracle.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CallbackError, Result};
use crate::records::Record;

/// Path segment under which the oracle serves object status.
const OBJECTS_PATH: &str = "/objects/";

// == Status Oracle ==
/// Answers "is object X online" for a single identifier.
#[async_trait]
pub trait StatusOracle: Debug + Send + Sync {
    /// Fetches the oracle's view of `id`.
    ///
    /// Implementations bound the call with their own timeout.
    async fn status(&self, id: i64) -> Result<Record>;
}

// == HTTP Oracle ==
/// `reqwest`-backed oracle client with a fixed per-call timeout.
#[derive(Debug, Clone)]
pub struct HttpOracle {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOracle {
    /// Creates a client for the oracle at `base_url`.
    ///
    /// # Arguments
    /// * `base_url` - Oracle root, e.g. `http://0.0.0.0:9010`
    /// * `timeout` - Upper bound for a whole request, body included
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CallbackError::Internal(format!("building oracle client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// URL queried for `id`.
    pub fn object_url(&self, id: i64) -> String {
        format!("{}{}{}", self.base_url, OBJECTS_PATH, id)
    }
}

#[async_trait]
impl StatusOracle for HttpOracle {
    async fn status(&self, id: i64) -> Result<Record> {
        let url = self.object_url(id);
        debug!(id, %url, "querying status oracle");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| request_error(id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CallbackError::OracleStatus {
                id,
                status: status.as_u16(),
            });
        }

        response.json::<Record>().await.map_err(|e| {
            if e.is_timeout() {
                CallbackError::OracleTimeout(id)
            } else {
                CallbackError::OracleDecode {
                    id,
                    reason: e.to_string(),
                }
            }
        })
    }
}

fn request_error(id: i64, err: reqwest::Error) -> CallbackError {
    if err.is_timeout() {
        CallbackError::OracleTimeout(id)
    } else {
        CallbackError::OracleTransport {
            id,
            reason: err.to_string(),
        }
    }
}
