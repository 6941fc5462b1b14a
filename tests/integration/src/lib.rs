//! Integration test utilities for the stash API
//!
//! Starts the real router on an ephemeral port with in-memory storage and
//! drives it over HTTP.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
