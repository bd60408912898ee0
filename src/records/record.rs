//! Freshness Record Module
//!
//! Defines the persisted `{id, online, timestamp}` tuple and the clock helpers
//! used to stamp and expire it.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

// == Record ==
/// Last known reachability of one external object.
///
/// Also the body shape returned by the status oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Caller-supplied object identifier
    pub id: i64,
    /// Whether the object was reachable
    pub online: bool,
    /// Unix seconds at which the object was last affirmed online
    pub timestamp: i64,
}

impl Record {
    // == Constructor ==
    pub fn new(id: i64, online: bool, timestamp: i64) -> Self {
        Self {
            id,
            online,
            timestamp,
        }
    }

    // == Affirm ==
    /// Returns an online copy of this record stamped with the current time.
    pub fn affirmed_now(self) -> Self {
        Self {
            online: true,
            timestamp: unix_now(),
            ..self
        }
    }

    // == Is Stale ==
    /// A record is stale once its timestamp is at or before `threshold`.
    pub fn is_stale(&self, threshold: i64) -> bool {
        self.timestamp <= threshold
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Returns the Unix second at or before which a record written `ttl` ago is stale.
///
/// Floors to whole seconds, so a record stamped when the window opened is
/// always at or below the threshold once `ttl` has elapsed.
pub fn stale_threshold(ttl: Duration) -> i64 {
    // A window too large to represent never expires anything
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        .map(|cutoff| cutoff.timestamp())
        .unwrap_or(i64::MIN)
}
