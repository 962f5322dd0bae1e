//! Configuration types for a scenario run

use crate::engine::TerraformConfig;
use crate::scenario::{RunnerConfig, ScenarioKind, ScenarioSettings};
use crate::wait::WaitConfig;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Run configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("region cannot be empty")]
    EmptyRegion,

    #[error("terraform binary path cannot be empty")]
    EmptyTerraform,

    #[error("provider version constraint cannot be empty")]
    EmptyProviderVersion,

    #[error("parallel must be at least 1, got {0}")]
    InvalidParallel(usize),

    #[error("command timeout must be at least 1 second")]
    InvalidCommandTimeout,

    #[error("deletion timeout must be at least 1 second")]
    InvalidDeletionTimeout,

    #[error("no scenarios selected")]
    NoScenarios,
}

/// AWS credentials and location
#[derive(Debug, Clone)]
pub struct AwsConfig {
    /// AWS region
    pub region: String,
    /// AWS profile name (overrides default credential resolution)
    pub aws_profile: Option<String>,
}

/// How terraform is invoked
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the terraform binary
    pub terraform: PathBuf,
    /// AWS provider version constraint
    pub provider_version: String,
    /// Shared provider plugin cache
    pub plugin_cache_dir: Option<PathBuf>,
    /// Timeout per terraform invocation in seconds
    pub command_timeout_secs: u64,
    /// Leave working directories on disk
    pub keep_workdir: bool,
}

/// Which scenarios run and how
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub scenarios: Vec<ScenarioKind>,
    /// Delay after creating IAM roles in seconds
    pub propagation_delay_secs: u64,
    /// Timeout for out-of-band index deletion in seconds
    pub deletion_timeout_secs: u64,
    /// Scenarios run concurrently
    pub parallel: usize,
    /// Output JSON file path
    pub output: Option<PathBuf>,
}

/// Configuration for a scenario run
///
/// Composed of focused sub-configs, each mapping onto one part of the runner.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub aws: AwsConfig,
    pub engine: EngineConfig,
    pub scenario: ScenarioConfig,
}

impl RunConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aws.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        if self.engine.terraform.as_os_str().is_empty() {
            return Err(ConfigError::EmptyTerraform);
        }
        if self.engine.provider_version.trim().is_empty() {
            return Err(ConfigError::EmptyProviderVersion);
        }
        if self.engine.command_timeout_secs == 0 {
            return Err(ConfigError::InvalidCommandTimeout);
        }
        if self.scenario.deletion_timeout_secs == 0 {
            return Err(ConfigError::InvalidDeletionTimeout);
        }
        if self.scenario.parallel == 0 {
            return Err(ConfigError::InvalidParallel(self.scenario.parallel));
        }
        if self.scenario.scenarios.is_empty() {
            return Err(ConfigError::NoScenarios);
        }
        Ok(())
    }

    pub fn terraform_config(&self) -> TerraformConfig {
        TerraformConfig {
            binary: self.engine.terraform.clone(),
            region: self.aws.region.clone(),
            aws_profile: self.aws.aws_profile.clone(),
            provider_version: self.engine.provider_version.clone(),
            plugin_cache_dir: self.engine.plugin_cache_dir.clone(),
            command_timeout: Duration::from_secs(self.engine.command_timeout_secs),
            keep_workdir: self.engine.keep_workdir,
        }
    }

    pub fn scenario_settings(&self) -> ScenarioSettings {
        ScenarioSettings {
            propagation_delay: Duration::from_secs(self.scenario.propagation_delay_secs),
        }
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            deletion_wait: WaitConfig::for_index_deletion(Duration::from_secs(
                self.scenario.deletion_timeout_secs,
            )),
        }
    }
}
