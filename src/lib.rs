//! Callback Service - object freshness tracking
//!
//! Accepts batches of object ids, asks a status oracle which objects are
//! online, and keeps a self-expiring freshness record for each of them.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod oracle;
pub mod pipeline;
pub mod records;

pub use api::AppState;
pub use config::{Config, PipelineConfig};
pub use error::{CallbackError, Result};
