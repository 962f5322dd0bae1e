//! kendra-acc-common - Shared types and pure logic
//!
//! This crate holds everything the scenario runner needs that does not
//! touch the network, keeping it free of AWS SDK dependencies.
//!
//! ## Modules
//!
//! - [`assertions`]: attribute checks over recorded state
//! - [`defaults`]: default names, addresses and timings
//! - [`fixtures`]: random, prefixed resource names
//! - [`flatmap`]: dotted-key flattening of resource values
//! - [`hcl`]: configuration rendering
//! - [`policy`]: IAM policy documents for the role fixtures
//! - [`resource_kind`]: sweep ordering for leftover fixtures
//! - [`state`]: recorded engine state

pub mod assertions;
pub mod defaults;
pub mod error;
pub mod fixtures;
pub mod flatmap;
pub mod hcl;
pub mod policy;
pub mod resource_kind;
pub mod state;

// Re-export commonly used types
pub use error::{AssertionError, AttributeDiff, StateError};
pub use fixtures::ScenarioNames;
pub use hcl::{IndexSpec, RoleVariant};
pub use resource_kind::SweepKind;
pub use state::{ResourceMode, ResourceState, State};
