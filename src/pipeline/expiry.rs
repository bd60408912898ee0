//! Expiration Scheduler
//!
//! Arms one-shot deletion timers for freshly written records.
//!
//! A timer captures the ids it was armed for and, once the TTL has elapsed,
//! deletes only those still carrying a timestamp at or before `now - TTL`.
//! Records refreshed in the meantime fail that predicate and survive, so
//! overlapping timers for the same id never evict a newer write.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::records::{stale_threshold, PipelineStats, RecordStore};

// == Expiration Scheduler ==
#[derive(Debug, Clone)]
pub struct ExpirationScheduler {
    store: Arc<dyn RecordStore>,
    ttl: Duration,
    stats: Arc<PipelineStats>,
    /// Timers armed but not yet fired
    pending: Arc<AtomicUsize>,
}

impl ExpirationScheduler {
    /// Creates a scheduler deleting stale records from `store` after `ttl`.
    pub fn new(store: Arc<dyn RecordStore>, ttl: Duration, stats: Arc<PipelineStats>) -> Self {
        Self {
            store,
            ttl,
            stats,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Self-delete window applied by every timer.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of armed timers that have not fired yet.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    // == Arm ==
    /// Spawns a single-shot timer bound to `ids`.
    ///
    /// The timer cannot be cancelled; the returned handle only lets callers
    /// await the firing. Deletion failures are logged and dropped.
    pub fn arm(&self, ids: Vec<i64>) -> JoinHandle<()> {
        let store = self.store.clone();
        let stats = self.stats.clone();
        let pending = self.pending.clone();
        let ttl = self.ttl;

        pending.fetch_add(1, Ordering::Relaxed);
        debug!(count = ids.len(), ttl_ms = ttl.as_millis() as u64, "expiration timer armed");

        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;

            let threshold = stale_threshold(ttl);
            match store.delete_stale(&ids, threshold).await {
                Ok(removed) => {
                    stats.record_expired(removed);
                    if removed > 0 {
                        info!(removed, bound = ids.len(), "expired stale records");
                    } else {
                        debug!(bound = ids.len(), "expiration timer fired, all records refreshed");
                    }
                }
                Err(e) => {
                    warn!(bound = ids.len(), error = %e, "expiration delete failed");
                }
            }

            pending.fetch_sub(1, Ordering::Relaxed);
        })
    }
}
