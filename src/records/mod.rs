//! Records Module
//!
//! Freshness records, the keyed store that holds them, and pipeline counters.

mod record;
mod stats;
mod store;

// Re-export public types
pub use record::{stale_threshold, unix_now, Record};
pub use stats::{PipelineStats, StatsSnapshot};
pub use store::{MemoryStore, RecordStore};
