//! AWS client modules for the scenario runner
//!
//! This module provides wrappers around AWS SDK clients for:
//! - Kendra: index lookups and out-of-band deletion
//! - IAM: listing and deleting leftover fixture roles
//! - STS: caller identity for the credential pre-check
//! - sweep: prefix-based cleanup of leftover fixtures

pub mod account;
pub mod context;
pub mod error;
pub mod iam;
pub mod kendra;
pub mod sweep;

pub use account::{AccountId, CallerIdentity, get_caller_identity};
pub use context::{AwsContext, FromAwsContext};
pub use iam::{IamClient, RoleApi};
pub use kendra::{IndexApi, IndexSummary, KendraClient, delete_index_and_wait};
pub use sweep::{SweepConfig, SweepReport, Sweeper};

// Error handling
pub use error::{AwsError, classify_aws_error, classify_sdk_error, ignore_not_found};
