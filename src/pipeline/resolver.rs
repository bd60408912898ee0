//! Fan-out Resolver
//!
//! Resolves and persists every id of a deduplicated batch concurrently.
//!
//! `dispatch` launches one task per id and returns without waiting for any of
//! them. Each task asks the oracle about its id and, if the object is online,
//! stamps it and writes it through the [`FreshnessRepository`]. Failures stay
//! inside the task that hit them: they are logged and counted, never returned
//! to the caller. A detached supervisor drains the tasks and logs one summary
//! line per batch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::error::{CallbackError, Result};
use crate::oracle::StatusOracle;
use crate::pipeline::FreshnessRepository;
use crate::records::{PipelineStats, Record};

// == Outcomes ==
/// How a single id's resolution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Oracle reported online and the record was written
    Persisted,
    /// Oracle reported offline, nothing written
    Offline,
}

/// Per-batch tally produced by the supervisor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub persisted: usize,
    pub offline: usize,
    pub failed: usize,
}

/// Receipt for a launched batch.
///
/// Dropping it detaches the supervisor; the batch keeps running.
#[derive(Debug)]
pub struct BatchTicket {
    /// Number of per-id tasks spawned
    pub launched: usize,
    completion: JoinHandle<BatchSummary>,
}

impl BatchTicket {
    /// Waits for every task of the batch and returns the tally.
    pub async fn wait(self) -> Result<BatchSummary> {
        self.completion
            .await
            .map_err(|e| CallbackError::Internal(format!("batch supervisor failed: {}", e)))
    }
}

// == Fan-out Resolver ==
#[derive(Debug, Clone)]
pub struct FanOutResolver {
    oracle: Arc<dyn StatusOracle>,
    repository: FreshnessRepository,
    stats: Arc<PipelineStats>,
    /// Shared by all batches, bounds concurrent oracle calls
    permits: Arc<Semaphore>,
    max_batch_size: usize,
    oracle_retries: u32,
    retry_backoff: Duration,
    closed: Arc<AtomicBool>,
}

impl FanOutResolver {
    pub fn new(
        oracle: Arc<dyn StatusOracle>,
        repository: FreshnessRepository,
        config: &PipelineConfig,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            oracle,
            repository,
            stats,
            permits: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
            max_batch_size: config.max_batch_size,
            oracle_retries: config.oracle_retries,
            retry_backoff: config.retry_backoff,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn repository(&self) -> &FreshnessRepository {
        &self.repository
    }

    /// Refuses every later batch. Batches already launched run to completion.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // == Dispatch ==
    /// Launches one resolution task per id and returns immediately.
    ///
    /// Only validation can fail here; once tasks are spawned the call succeeds
    /// regardless of what happens to any of them.
    ///
    /// # Arguments
    /// * `ids` - Deduplicated identifiers, see [`crate::pipeline::dedup_ids`]
    pub fn dispatch(&self, ids: Vec<i64>) -> Result<BatchTicket> {
        if self.is_closed() {
            self.stats.record_rejected();
            return Err(CallbackError::Rejected(
                "resolver is shutting down".to_string(),
            ));
        }
        if ids.len() > self.max_batch_size {
            self.stats.record_rejected();
            return Err(CallbackError::Rejected(format!(
                "batch of {} ids exceeds limit of {}",
                ids.len(),
                self.max_batch_size
            )));
        }

        self.stats.record_batch(ids.len());

        let mut tasks = JoinSet::new();
        for id in ids {
            let worker = self.clone();
            tasks.spawn(async move { (id, worker.run_one(id).await) });
        }

        let launched = tasks.len();
        debug!(launched, "batch dispatched");

        let completion = tokio::spawn(supervise(tasks, self.stats.clone()));
        Ok(BatchTicket {
            launched,
            completion,
        })
    }

    /// Resolves one id, recording its outcome.
    async fn run_one(&self, id: i64) -> Result<Outcome> {
        let result = self.resolve_one(id).await;
        match &result {
            Ok(Outcome::Persisted) => self.stats.record_persisted(),
            Ok(Outcome::Offline) => {
                self.stats.record_offline();
                debug!(id, "object offline, nothing written");
            }
            Err(e) => {
                self.stats.record_failure();
                warn!(id, error = %e, "dropping object after failed resolution");
            }
        }
        result
    }

    async fn resolve_one(&self, id: i64) -> Result<Outcome> {
        let observed = self.status_with_retry(id).await?;
        if observed.id != id {
            warn!(
                id,
                reported = observed.id,
                "oracle answered for another object, keeping requested id"
            );
        }
        if !observed.online {
            return Ok(Outcome::Offline);
        }

        let record = Record { id, ..observed }.affirmed_now();
        self.repository.upsert(&[record]).await?;
        Ok(Outcome::Persisted)
    }

    /// Queries the oracle, retrying transient failures up to `oracle_retries`
    /// times. A permit is held only for the duration of each call.
    async fn status_with_retry(&self, id: i64) -> Result<Record> {
        let mut attempt = 0;
        loop {
            match self.status_once(id).await {
                Ok(record) => return Ok(record),
                Err(e) if e.is_transient() && attempt < self.oracle_retries => {
                    attempt += 1;
                    debug!(id, attempt, error = %e, "oracle call failed, retrying");
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn status_once(&self, id: i64) -> Result<Record> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CallbackError::Internal("resolver permits closed".to_string()))?;

        self.oracle.status(id).await
    }
}

// == Supervisor ==
/// Drains the per-id tasks of one batch and logs the aggregate.
async fn supervise(
    mut tasks: JoinSet<(i64, Result<Outcome>)>,
    stats: Arc<PipelineStats>,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    let mut first_error: Option<String> = None;

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((_, Ok(Outcome::Persisted))) => summary.persisted += 1,
            Ok((_, Ok(Outcome::Offline))) => summary.offline += 1,
            Ok((id, Err(e))) => {
                summary.failed += 1;
                first_error.get_or_insert_with(|| format!("object {}: {}", id, e));
            }
            Err(e) => {
                // Panicked task, never counted by run_one
                summary.failed += 1;
                stats.record_failure();
                first_error.get_or_insert_with(|| format!("resolution task failed: {}", e));
            }
        }
    }

    match first_error {
        Some(error) => warn!(
            persisted = summary.persisted,
            offline = summary.offline,
            failed = summary.failed,
            %error,
            "batch finished with failures"
        ),
        None => debug!(
            persisted = summary.persisted,
            offline = summary.offline,
            "batch finished"
        ),
    }

    summary
}
