//! Provisioning engine boundary
//!
//! The runner submits configuration text and reads back recorded state
//! through [`ProvisioningEngine`]. [`TerraformCli`] drives the real
//! `terraform` binary; tests substitute an in-memory fake.

pub mod command;
pub mod terraform;

pub use command::{CommandConfig, CommandOutput, run_command};
pub use terraform::{TerraformCli, TerraformConfig};

use kendra_acc_common::{State, StateError};
use std::future::Future;
use std::path::PathBuf;
use thiserror::Error;

/// Engine command failures
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to spawn {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },

    /// Non-zero exit; stderr is kept verbatim
    #[error("'{command}' failed with exit code {code:?}:\n{stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// An output stream was still open when the flush timeout ran out
    #[error("'{command}' {stream} was not fully read within {secs}s; output truncated")]
    OutputTruncated {
        command: String,
        stream: &'static str,
        secs: u64,
    },

    #[error(transparent)]
    State(#[from] StateError),

    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

/// Result of planning a configuration against the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOutcome {
    pub has_changes: bool,
}

/// Operations the scenario runner needs from a provisioning engine.
pub trait ProvisioningEngine: Send + Sync {
    /// Apply `config`, creating or updating resources to match it
    fn apply(&self, config: &str) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Plan `config` without applying it
    fn plan(&self, config: &str) -> impl Future<Output = Result<PlanOutcome, EngineError>> + Send;

    /// Current recorded state
    fn state(&self) -> impl Future<Output = Result<State, EngineError>> + Send;

    /// Import `id` into `address` in a scratch workspace and return that state
    fn import(
        &self,
        config: &str,
        address: &str,
        id: &str,
    ) -> impl Future<Output = Result<State, EngineError>> + Send;

    /// Destroy everything in the recorded state
    fn destroy(&self, config: &str) -> impl Future<Output = Result<(), EngineError>> + Send;
}
