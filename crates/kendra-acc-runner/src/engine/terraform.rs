//! `terraform` CLI implementation of [`ProvisioningEngine`]
//!
//! Each scenario gets its own working directory holding `provider.tf` and
//! `main.tf`. Imports run in a throwaway directory so they never touch the
//! scenario's state.

use super::command::{CommandConfig, CommandOutput, run_command};
use super::{EngineError, PlanOutcome, ProvisioningEngine};
use kendra_acc_common::State;
use kendra_acc_common::defaults::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_PROVIDER_VERSION, DEFAULT_REGION, DEFAULT_TERRAFORM_BIN,
};
use kendra_acc_common::hcl::provider_config;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PROVIDER_FILE: &str = "provider.tf";
const CONFIG_FILE: &str = "main.tf";

/// Settings for driving the terraform binary
#[derive(Debug, Clone)]
pub struct TerraformConfig {
    /// Binary to run, resolved through `PATH` when not absolute
    pub binary: PathBuf,
    pub region: String,
    pub aws_profile: Option<String>,
    /// AWS provider version constraint
    pub provider_version: String,
    /// Shared provider plugin cache
    pub plugin_cache_dir: Option<PathBuf>,
    /// Timeout for each terraform invocation
    pub command_timeout: Duration,
    /// Leave the working directory on disk after the scenario
    pub keep_workdir: bool,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_TERRAFORM_BIN),
            region: DEFAULT_REGION.to_string(),
            aws_profile: None,
            provider_version: DEFAULT_PROVIDER_VERSION.to_string(),
            plugin_cache_dir: None,
            command_timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            keep_workdir: false,
        }
    }
}

enum Workdir {
    Temp(TempDir),
    Kept(PathBuf),
}

impl Workdir {
    fn path(&self) -> &Path {
        match self {
            Workdir::Temp(dir) => dir.path(),
            Workdir::Kept(path) => path,
        }
    }
}

/// Terraform working directory for one scenario
pub struct TerraformCli {
    config: TerraformConfig,
    workdir: Workdir,
    initialized: AtomicBool,
}

impl TerraformCli {
    /// Create a fresh working directory for a scenario
    pub fn new(config: TerraformConfig, scenario: &str) -> Result<Self, EngineError> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("kendra-acc-{scenario}-"))
            .tempdir()?;

        let workdir = if config.keep_workdir {
            let path = dir.keep();
            info!(workdir = %path.display(), "Keeping terraform working directory");
            Workdir::Kept(path)
        } else {
            Workdir::Temp(dir)
        };

        Ok(Self {
            config,
            workdir,
            initialized: AtomicBool::new(false),
        })
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    fn command_config(&self) -> CommandConfig {
        let mut config = CommandConfig::with_timeout_secs(self.config.command_timeout.as_secs())
            .env("TF_IN_AUTOMATION", "1")
            .env("TF_INPUT", "0")
            .env("CHECKPOINT_DISABLE", "1")
            .env("AWS_REGION", &self.config.region);
        if let Some(profile) = &self.config.aws_profile {
            config = config.env("AWS_PROFILE", profile);
        }
        if let Some(cache) = &self.config.plugin_cache_dir {
            config = config.env("TF_PLUGIN_CACHE_DIR", cache.display().to_string());
        }
        config
    }

    async fn write_config(&self, dir: &Path, config: &str) -> Result<(), EngineError> {
        let provider = provider_config(&self.config.region, &self.config.provider_version);
        tokio::fs::write(dir.join(PROVIDER_FILE), provider).await?;
        tokio::fs::write(dir.join(CONFIG_FILE), config).await?;
        debug!(dir = %dir.display(), bytes = config.len(), "Wrote configuration");
        Ok(())
    }

    async fn exec(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput, EngineError> {
        run_command(&self.config.binary, args, dir, &self.command_config()).await
    }

    /// Run and require a zero exit code
    async fn exec_ok(&self, dir: &Path, args: &[&str]) -> Result<CommandOutput, EngineError> {
        let out = self.exec(dir, args).await?;
        if out.success() {
            Ok(out)
        } else {
            Err(EngineError::Failed {
                command: format!("terraform {}", args.join(" ")),
                code: out.code,
                stderr: out.stderr,
            })
        }
    }

    async fn init(&self, dir: &Path) -> Result<(), EngineError> {
        self.exec_ok(dir, &["init", "-input=false", "-no-color"]).await?;
        Ok(())
    }

    async fn init_once(&self) -> Result<(), EngineError> {
        if !self.initialized.load(Ordering::Acquire) {
            self.init(self.workdir()).await?;
            self.initialized.store(true, Ordering::Release);
        }
        Ok(())
    }

    async fn show(&self, dir: &Path) -> Result<State, EngineError> {
        let out = self.exec_ok(dir, &["show", "-json", "-no-color"]).await?;
        Ok(State::from_show_json(&out.stdout)?)
    }
}

/// Interpret `plan -detailed-exitcode`: 0 is empty, 2 has changes.
fn plan_outcome(out: CommandOutput) -> Result<PlanOutcome, EngineError> {
    match out.code {
        Some(0) => Ok(PlanOutcome { has_changes: false }),
        Some(2) => Ok(PlanOutcome { has_changes: true }),
        code => Err(EngineError::Failed {
            command: "terraform plan".to_string(),
            code,
            stderr: out.stderr,
        }),
    }
}

impl ProvisioningEngine for TerraformCli {
    async fn apply(&self, config: &str) -> Result<(), EngineError> {
        self.write_config(self.workdir(), config).await?;
        self.init_once().await?;
        self.exec_ok(
            self.workdir(),
            &["apply", "-auto-approve", "-input=false", "-no-color"],
        )
        .await?;
        Ok(())
    }

    async fn plan(&self, config: &str) -> Result<PlanOutcome, EngineError> {
        self.write_config(self.workdir(), config).await?;
        self.init_once().await?;
        let out = self
            .exec(
                self.workdir(),
                &["plan", "-input=false", "-no-color", "-detailed-exitcode"],
            )
            .await?;
        plan_outcome(out)
    }

    async fn state(&self) -> Result<State, EngineError> {
        self.show(self.workdir()).await
    }

    async fn import(&self, config: &str, address: &str, id: &str) -> Result<State, EngineError> {
        let scratch = tempfile::Builder::new()
            .prefix("kendra-acc-import-")
            .tempdir()?;
        info!(address = %address, id = %id, "Importing into scratch workspace");

        self.write_config(scratch.path(), config).await?;
        self.init(scratch.path()).await?;
        self.exec_ok(
            scratch.path(),
            &["import", "-input=false", "-no-color", address, id],
        )
        .await?;
        self.show(scratch.path()).await
    }

    async fn destroy(&self, config: &str) -> Result<(), EngineError> {
        self.write_config(self.workdir(), config).await?;
        self.init_once().await?;
        self.exec_ok(
            self.workdir(),
            &["destroy", "-auto-approve", "-input=false", "-no-color"],
        )
        .await?;
        Ok(())
    }
}
