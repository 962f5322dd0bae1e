//! Scenarios: named, ordered steps over one index
//!
//! - [`check`]: post-step checks
//! - [`catalog`]: the scenario definitions
//! - [`precheck`]: suite pre-check and error classification
//! - [`runner`]: step execution and teardown

pub mod catalog;
pub mod check;
pub mod precheck;
pub mod runner;

pub use catalog::{ScenarioKind, ScenarioSettings};
pub use check::{Check, CheckContext, CheckError};
pub use precheck::{PreCheck, error_check, pre_check};
pub use runner::{RunnerConfig, ScenarioOutcome, ScenarioReport, ScenarioRunner, StepFailure};

use crate::snapshot::SnapshotSlot;
use kendra_acc_common::ScenarioNames;

/// One step of a scenario
#[derive(Debug, Clone)]
pub enum Step {
    /// Apply configuration text, then run checks and a follow-up plan
    Apply {
        config: String,
        checks: Vec<Check>,
        /// The follow-up plan is expected to show drift
        expect_non_empty_plan: bool,
    },
    /// Import the resource at `address` by its recorded id
    Import {
        address: String,
        /// Compare imported attributes with the applied ones
        verify: bool,
        /// Attribute prefixes left out of the comparison
        verify_ignore: Vec<String>,
        checks: Vec<Check>,
    },
}

impl Step {
    pub fn apply(config: String, checks: Vec<Check>) -> Self {
        Step::Apply {
            config,
            checks,
            expect_non_empty_plan: false,
        }
    }

    pub fn import_verify(address: &str, checks: Vec<Check>) -> Self {
        Step::Import {
            address: address.to_string(),
            verify: true,
            verify_ignore: Vec::new(),
            checks,
        }
    }

    /// Mark an apply step as expecting drift afterwards
    pub fn expect_non_empty_plan(mut self) -> Self {
        if let Step::Apply {
            expect_non_empty_plan,
            ..
        } = &mut self
        {
            *expect_non_empty_plan = true;
        }
        self
    }

    pub fn checks(&self) -> &[Check] {
        match self {
            Step::Apply { checks, .. } | Step::Import { checks, .. } => checks,
        }
    }

    pub fn config(&self) -> Option<&str> {
        match self {
            Step::Apply { config, .. } => Some(config),
            Step::Import { .. } => None,
        }
    }
}

/// A named, ordered list of steps with its own fixtures
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub names: ScenarioNames,
    /// Last remote snapshot, shared by the scenario's checks
    pub slot: SnapshotSlot,
    pub steps: Vec<Step>,
}
