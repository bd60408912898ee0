//! Oracle Module
//!
//! Client side of the external status oracle.

mod client;

pub use client::{HttpOracle, StatusOracle};
