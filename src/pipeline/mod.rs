//! Pipeline Module
//!
//! The freshness-record pipeline: batch deduplication, concurrent status
//! resolution, conditional upsert and self-expiring records.

mod dedup;
mod expiry;
mod repository;
mod resolver;


pub use dedup::dedup_ids;
pub use expiry::ExpirationScheduler;
pub use repository::FreshnessRepository;
pub use resolver::{BatchSummary, BatchTicket, FanOutResolver, Outcome};
