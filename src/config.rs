//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the status oracle
    pub oracle_url: String,
    /// Per-call oracle timeout in seconds
    pub oracle_timeout: u64,
    /// Record self-delete window in seconds
    pub record_ttl: u64,
    /// Maximum concurrent oracle resolutions
    pub max_in_flight: usize,
    /// Largest batch accepted by POST /callback
    pub max_batch_size: usize,
    /// Extra oracle attempts per object after a failure
    pub oracle_retries: u32,
    /// Pause between oracle attempts in milliseconds
    pub retry_backoff_ms: u64,
    /// Seconds in-flight requests get to finish after a shutdown signal
    pub shutdown_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 9090)
    /// - `ORACLE_URL` - Status oracle base URL (default: http://0.0.0.0:9010)
    /// - `ORACLE_TIMEOUT_SECS` - Oracle call timeout (default: 5)
    /// - `RECORD_TTL_SECS` - Record self-delete window (default: 30)
    /// - `MAX_IN_FLIGHT` - Concurrent oracle resolutions (default: 64)
    /// - `MAX_BATCH_SIZE` - Largest accepted batch (default: 10000)
    /// - `ORACLE_RETRIES` - Extra oracle attempts (default: 0)
    /// - `RETRY_BACKOFF_MS` - Pause between attempts (default: 200)
    /// - `SHUTDOWN_TIMEOUT_SECS` - Drain deadline after a signal (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            oracle_url: env::var("ORACLE_URL").unwrap_or(defaults.oracle_url),
            oracle_timeout: parse_var("ORACLE_TIMEOUT_SECS", defaults.oracle_timeout),
            record_ttl: parse_var("RECORD_TTL_SECS", defaults.record_ttl),
            max_in_flight: parse_var("MAX_IN_FLIGHT", defaults.max_in_flight),
            max_batch_size: parse_var("MAX_BATCH_SIZE", defaults.max_batch_size),
            oracle_retries: parse_var("ORACLE_RETRIES", defaults.oracle_retries),
            retry_backoff_ms: parse_var("RETRY_BACKOFF_MS", defaults.retry_backoff_ms),
            shutdown_timeout: parse_var("SHUTDOWN_TIMEOUT_SECS", defaults.shutdown_timeout),
        }
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }

    /// Pipeline policy derived from this configuration.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            record_ttl: Duration::from_secs(self.record_ttl),
            oracle_timeout: Duration::from_secs(self.oracle_timeout),
            max_in_flight: self.max_in_flight.max(1),
            max_batch_size: self.max_batch_size,
            oracle_retries: self.oracle_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 9090,
            oracle_url: "http://0.0.0.0:9010".to_string(),
            oracle_timeout: 5,
            record_ttl: 30,
            max_in_flight: 64,
            max_batch_size: 10_000,
            oracle_retries: 0,
            retry_backoff_ms: 200,
            shutdown_timeout: 5,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Runtime policy consumed by the resolver, the oracle client and the
/// expiration scheduler. Built once and threaded in at construction.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How long a record lives without being re-affirmed
    pub record_ttl: Duration,
    /// Per-call oracle timeout
    pub oracle_timeout: Duration,
    /// Concurrent oracle resolutions across all batches
    pub max_in_flight: usize,
    /// Largest batch accepted for fan-out
    pub max_batch_size: usize,
    /// Extra oracle attempts per object
    pub oracle_retries: u32,
    /// Pause between oracle attempts
    pub retry_backoff: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Config::default().pipeline()
    }
}
