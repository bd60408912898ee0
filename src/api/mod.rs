//! API Module
//!
//! HTTP handlers and routing for the callback service REST API.
//!
//! # Endpoints
//! - `POST /callback` - Submit a batch of object ids for status resolution
//! - `GET /` - Health check endpoint
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Pipeline statistics

pub mod handlers;
pub mod routes;
pub mod server;

pub use handlers::*;
pub use routes::create_router;
pub use server::{serve_until, Drain};
