//! Shared test utilities for kendra-acc
//!
//! Helpers for the live acceptance tests, kept out of the runner so they
//! never end up in the binary.
//!
//! ## Modules
//!
//! - [`aws`]: AWS region detection, acceptance gating and run ID generation

pub mod aws;

// Re-export commonly used items
pub use aws::{acceptance_enabled, get_test_region, test_run_id};
