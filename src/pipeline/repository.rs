//! Freshness Repository
//!
//! Writes records to the store and arms exactly one expiration timer per
//! successful write.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::pipeline::ExpirationScheduler;
use crate::records::{PipelineStats, Record, RecordStore};

/// Store handle paired with the scheduler that expires what it writes.
#[derive(Debug, Clone)]
pub struct FreshnessRepository {
    store: Arc<dyn RecordStore>,
    scheduler: ExpirationScheduler,
}

impl FreshnessRepository {
    /// Creates a repository whose records expire `ttl` after being written.
    pub fn new(store: Arc<dyn RecordStore>, ttl: Duration, stats: Arc<PipelineStats>) -> Self {
        let scheduler = ExpirationScheduler::new(store.clone(), ttl, stats);
        Self { store, scheduler }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn scheduler(&self) -> &ExpirationScheduler {
        &self.scheduler
    }

    // == Upsert ==
    /// Writes `records`, last writer wins on id conflict, then arms one timer
    /// bound to the written ids.
    ///
    /// A failed write arms nothing and is returned to the caller.
    pub async fn upsert(&self, records: &[Record]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        self.store.upsert(records).await?;

        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        debug!(count = ids.len(), "records upserted");
        // Detached: the timer outlives this call
        drop(self.scheduler.arm(ids));

        Ok(())
    }
}
