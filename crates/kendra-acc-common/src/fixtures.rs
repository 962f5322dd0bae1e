//! Random name fixtures
//!
//! Concurrent scenarios share one AWS account and region. They stay apart
//! only because every name they create is unique, so all names come from
//! [`random_with_prefix`].

use crate::defaults::RESOURCE_PREFIX;
use rand::Rng;

/// Generate `{prefix}-{n}` where `n` is a random non-negative 63-bit integer.
pub fn random_with_prefix(prefix: &str) -> String {
    let n: i64 = rand::thread_rng().gen_range(0..i64::MAX);
    format!("{}-{}", prefix, n)
}

/// Names owned by one scenario, generated once at scenario start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioNames {
    /// IAM role with CloudWatch access (`aws_iam_role.access_cw`)
    pub cw_role: String,
    /// IAM role with CloudWatch + Secrets Manager access (`aws_iam_role.access_sm`)
    pub sm_role: String,
    /// Index name
    pub index: String,
    /// Replacement index name for the rename scenario
    pub index_renamed: String,
}

impl ScenarioNames {
    /// Generate a fresh set of names with the standard prefix
    pub fn generate() -> Self {
        Self::with_prefix(RESOURCE_PREFIX)
    }

    /// Generate a fresh set of names with a custom prefix
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            cw_role: random_with_prefix(prefix),
            sm_role: random_with_prefix(prefix),
            index: random_with_prefix(prefix),
            index_renamed: random_with_prefix(prefix),
        }
    }
}
