//! AWS test utilities
//!
//! Provides region detection, acceptance gating and unique run ID generation
//! for live tests.

use chrono::Utc;

/// Region used when neither `AWS_REGION` nor `AWS_DEFAULT_REGION` is set
pub const FALLBACK_REGION: &str = "us-east-1";

/// Get the AWS region for tests.
///
/// Checks environment variables in order:
/// 1. AWS_REGION
/// 2. AWS_DEFAULT_REGION
/// 3. Falls back to us-east-1
///
/// # Example
///
/// ```
/// use kendra_acc_test_utils::aws::get_test_region;
///
/// let region = get_test_region();
/// assert!(!region.is_empty());
/// ```
pub fn get_test_region() -> String {
    std::env::var("AWS_REGION")
        .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
        .unwrap_or_else(|_| FALLBACK_REGION.to_string())
}

/// Whether live acceptance tests were requested.
///
/// Follows the terraform convention: `TF_ACC` set to any non-empty value
/// other than `0` enables them.
pub fn acceptance_enabled() -> bool {
    is_enabled(std::env::var("TF_ACC").ok().as_deref())
}

fn is_enabled(value: Option<&str>) -> bool {
    matches!(value, Some(v) if !v.is_empty() && v != "0")
}

/// Generate a unique run ID for test resources.
///
/// Format: `test-{timestamp_ms}-{counter}`, unique even when tests start
/// simultaneously within one process.
///
/// # Example
///
/// ```
/// use kendra_acc_test_utils::aws::test_run_id;
///
/// let run_id = test_run_id();
/// assert!(run_id.starts_with("test-"));
/// ```
pub fn test_run_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}", ts, counter)
}
