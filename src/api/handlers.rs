//! API Handlers
//!
//! HTTP request handlers for each callback service endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, warn};

use crate::config::{Config, PipelineConfig};
use crate::error::{CallbackError, Result};
use crate::models::{AcceptedResponse, CallbackRequest, HealthResponse, StatsResponse};
use crate::oracle::{HttpOracle, StatusOracle};
use crate::pipeline::{dedup_ids, FanOutResolver, FreshnessRepository};
use crate::records::{MemoryStore, PipelineStats, RecordStore};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Fans batches out to the oracle and the store
    pub resolver: FanOutResolver,
    /// Record table, also reached through the resolver
    pub store: Arc<dyn RecordStore>,
    /// Process-wide pipeline counters
    pub stats: Arc<PipelineStats>,
}

impl AppState {
    /// Wires a resolver around the given oracle and store.
    pub fn new(
        oracle: Arc<dyn StatusOracle>,
        store: Arc<dyn RecordStore>,
        pipeline: &PipelineConfig,
    ) -> Self {
        let stats = Arc::new(PipelineStats::new());
        let repository =
            FreshnessRepository::new(store.clone(), pipeline.record_ttl, stats.clone());
        let resolver = FanOutResolver::new(oracle, repository, pipeline, stats.clone());

        Self {
            resolver,
            store,
            stats,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Talks to the oracle at `config.oracle_url` and keeps records in memory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let pipeline = config.pipeline();
        let oracle = HttpOracle::new(config.oracle_url.clone(), pipeline.oracle_timeout)?;
        Ok(Self::new(
            Arc::new(oracle),
            Arc::new(MemoryStore::new()),
            &pipeline,
        ))
    }
}

/// Handler for POST /callback
///
/// Deduplicates the batch and launches resolution. Answers `{}` once the
/// tasks are started; persistence is not confirmed.
pub async fn callback_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CallbackRequest>, JsonRejection>,
) -> Result<Json<AcceptedResponse>> {
    let Json(req) = payload.map_err(|rejection| {
        debug!(error = %rejection, "unparseable callback body");
        CallbackError::InvalidJson
    })?;

    let received = req.object_ids.len();
    let ids = dedup_ids(&req.object_ids);

    // The ticket is dropped: the response never waits on resolution
    let ticket = state.resolver.dispatch(ids)?;
    debug!(received, launched = ticket.launched, "callback batch accepted");

    Ok(Json(AcceptedResponse::default()))
}

/// Handler for GET / and GET /health
///
/// Reports healthy when the record store answers a ping.
pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthResponse::ok())),
        Err(e) => {
            warn!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse::store_unreachable()),
            )
        }
    }
}

/// Handler for GET /stats
///
/// Returns pipeline counters, pending timers and the stored record count.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let records_stored = state.store.count().await?;
    let timers_pending = state.resolver.repository().scheduler().pending();

    Ok(Json(StatsResponse::new(
        state.stats.snapshot(),
        timers_pending,
        records_stored,
    )))
}
