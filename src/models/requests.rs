//! Request DTOs for the callback service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for POST /callback
///
/// # Fields
/// - `object_ids`: identifiers to resolve, in any order, repeats allowed
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackRequest {
    /// Batch of object identifiers
    pub object_ids: Vec<i64>,
}
