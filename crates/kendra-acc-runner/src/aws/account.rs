//! Caller identity lookup for the credential pre-check

use super::context::AwsContext;
use anyhow::{Context, Result};
use tracing::info;

/// Strongly-typed AWS account ID (12-digit string)
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

/// Who the loaded credentials belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account_id: AccountId,
    /// ARN of the calling principal
    pub arn: String,
}

impl CallerIdentity {
    #[cfg(test)]
    pub fn new(account_id: &str, arn: &str) -> Self {
        Self {
            account_id: AccountId(account_id.to_string()),
            arn: arn.to_string(),
        }
    }

    /// Partition of the caller, taken from the second ARN field (`aws`, `aws-us-gov`, ...)
    pub fn partition(&self) -> &str {
        self.arn.split(':').nth(1).unwrap_or("aws")
    }
}

/// Resolve the caller via STS GetCallerIdentity.
///
/// Needs no permissions, so a failure here means the credentials themselves
/// are missing or invalid.
pub async fn get_caller_identity(ctx: &AwsContext) -> Result<CallerIdentity> {
    let identity = ctx
        .sts_client()
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;
    let arn = identity.arn().unwrap_or_default();

    info!(account_id = %account, caller = %arn, "AWS credentials validated");

    Ok(CallerIdentity {
        account_id: AccountId(account.to_string()),
        arn: arn.to_string(),
    })
}
