//! Sweepable resource kinds and their deletion ordering
//!
//! Leftover fixtures must be deleted in dependency order: an index holds a
//! reference to its IAM role, so the index goes first.

use std::fmt;

/// Types of AWS resources a scenario can leave behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SweepKind {
    /// Kendra index (assumes an IAM role, so it is deleted first)
    KendraIndex,
    /// IAM role created for the index
    IamRole,
}

impl SweepKind {
    /// Get cleanup priority (lower number = cleanup first)
    pub fn cleanup_priority(self) -> u8 {
        match self {
            SweepKind::KendraIndex => 0,
            SweepKind::IamRole => 1,
        }
    }

    /// Stable name used in reports and logs
    pub fn as_str(self) -> &'static str {
        match self {
            SweepKind::KendraIndex => "kendra-index",
            SweepKind::IamRole => "iam-role",
        }
    }
}

impl fmt::Display for SweepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort items into cleanup order, keeping the relative order of equal kinds.
pub fn sort_for_cleanup<T, F>(items: &mut [T], kind: F)
where
    F: Fn(&T) -> SweepKind,
{
    items.sort_by_key(|item| kind(item).cleanup_priority());
}
