//! Batch Deduplication
//!
//! Reduces an incoming batch to distinct identifiers in first-seen order.

use std::collections::HashSet;

/// Returns each distinct id of `ids` exactly once, in order of first occurrence.
pub fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
