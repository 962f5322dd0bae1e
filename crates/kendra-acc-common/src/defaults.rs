//! Default configuration values shared between the runner and its tests
//!
//! These constants keep the CLI, the scenario catalogue and the live tests
//! in agreement about names, addresses and timings.

/// Prefix for every randomly generated fixture name
pub const RESOURCE_PREFIX: &str = "resource-test-terraform";

/// Terraform resource type under test
pub const INDEX_RESOURCE_TYPE: &str = "aws_kendra_index";

/// Address of the index resource in every rendered configuration
pub const INDEX_ADDRESS: &str = "aws_kendra_index.test";

/// Default AWS region for scenario runs
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default AWS provider version constraint
pub const DEFAULT_PROVIDER_VERSION: &str = "~> 5.0";

/// Default terraform binary (resolved through `PATH`)
pub const DEFAULT_TERRAFORM_BIN: &str = "terraform";

/// Wait after creating the IAM roles before Kendra may assume them (seconds)
pub const DEFAULT_PROPAGATION_DELAY_SECS: u64 = 30;

/// Timeout for a single terraform invocation (seconds).
///
/// Enterprise indexes take 20-30 minutes to become ACTIVE, so an apply that
/// creates one needs a generous budget.
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 3600;

/// Timeout when waiting for an out-of-band index deletion (seconds)
pub const DEFAULT_DELETION_TIMEOUT_SECS: u64 = 1800;

/// Default number of scenarios run concurrently
pub const DEFAULT_PARALLEL: usize = 5;

/// Regions where Amazon Kendra is offered
pub const KENDRA_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-2",
    "ca-central-1",
    "eu-west-1",
    "eu-west-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-northeast-1",
    "ap-south-1",
    "us-gov-west-1",
];

/// Whether Kendra is available in `region`
pub fn region_has_kendra(region: &str) -> bool {
    KENDRA_REGIONS.contains(&region)
}
