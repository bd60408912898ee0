//! Pipeline Statistics Module
//!
//! Tracks ingestion outcomes including persisted, offline and failed resolutions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Pipeline Stats ==
/// Process-wide counters shared by the handlers, the resolver tasks and the
/// expiration timers.
#[derive(Debug, Default)]
pub struct PipelineStats {
    batches_accepted: AtomicU64,
    batches_rejected: AtomicU64,
    ids_dispatched: AtomicU64,
    persisted: AtomicU64,
    offline: AtomicU64,
    failed: AtomicU64,
    expired: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Batches that passed validation and were fanned out
    pub batches_accepted: u64,
    /// Batches refused before fan-out
    pub batches_rejected: u64,
    /// Distinct ids handed to the resolver
    pub ids_dispatched: u64,
    /// Resolutions that ended in a store write
    pub persisted: u64,
    /// Resolutions where the oracle reported the object offline
    pub offline: u64,
    /// Resolutions dropped on an oracle or store error
    pub failed: u64,
    /// Records removed by expiration timers
    pub expired: u64,
}

impl PipelineStats {
    // == Constructor ==
    /// Creates a new PipelineStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Batch ==
    /// Counts an accepted batch of `ids` distinct identifiers.
    pub fn record_batch(&self, ids: usize) {
        self.batches_accepted.fetch_add(1, Ordering::Relaxed);
        self.ids_dispatched.fetch_add(ids as u64, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.batches_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self) {
        self.persisted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_offline(&self) {
        self.offline.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Expired ==
    /// Adds records removed by one timer firing.
    pub fn record_expired(&self, count: usize) {
        self.expired.fetch_add(count as u64, Ordering::Relaxed);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            batches_accepted: self.batches_accepted.load(Ordering::Relaxed),
            batches_rejected: self.batches_rejected.load(Ordering::Relaxed),
            ids_dispatched: self.ids_dispatched.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
            offline: self.offline.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
        }
    }
}
