//! kendra-acc-runner - acceptance scenarios for `aws_kendra_index`
//!
//! This crate drives terraform through a set of scenarios, checking the
//! recorded state and the live Kendra API after every step and tearing
//! everything down afterwards.

pub mod aws;
pub mod config;
pub mod engine;
pub mod report;
pub mod scenario;
pub mod snapshot;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;
