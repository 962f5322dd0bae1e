//! Suite-level pre-check and step error classification

use crate::aws::{AwsContext, CallerIdentity, get_caller_identity};
use anyhow::Result;
use kendra_acc_common::defaults::region_has_kendra;
use tracing::{info, warn};

/// Messages meaning the service or operation is not offered to this
/// account or region. A step failing with one of these is skipped.
const UNAVAILABLE_PATTERNS: &[&str] = &[
    "UnsupportedOperation",
    "is not supported in this region",
    "UnknownEndpoint",
    "no such host",
    "SubscriptionRequiredException",
];

/// Result of the pre-check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreCheck {
    /// Credentials resolve and Kendra is offered in the region
    Ready(CallerIdentity),
    /// Scenarios cannot run here; report them as skipped
    Skip(String),
}

/// Decide whether scenarios can run in `region` for `identity`.
pub fn evaluate(identity: CallerIdentity, region: &str) -> PreCheck {
    if region_has_kendra(region) {
        PreCheck::Ready(identity)
    } else {
        PreCheck::Skip(format!(
            "Kendra is not available in region {region} (partition {})",
            identity.partition()
        ))
    }
}

/// Validate credentials and service availability.
///
/// Invalid credentials are an error; a region without Kendra is a skip.
pub async fn pre_check(ctx: &AwsContext) -> Result<PreCheck> {
    let identity = get_caller_identity(ctx).await?;
    let outcome = evaluate(identity, ctx.region());
    match &outcome {
        PreCheck::Ready(identity) => {
            info!(account_id = %identity.account_id, region = %ctx.region(), "Pre-check passed")
        }
        PreCheck::Skip(reason) => warn!(reason = %reason, "Pre-check: skipping scenarios"),
    }
    Ok(outcome)
}

/// Classify a step failure: `Some(reason)` if it should be a skip.
pub fn error_check(message: &str) -> Option<String> {
    UNAVAILABLE_PATTERNS
        .iter()
        .find(|p| message.contains(*p))
        .map(|p| format!("Kendra unavailable ({p}): {}", first_line(message)))
}

fn first_line(message: &str) -> &str {
    message.lines().next().unwrap_or(message)
}
