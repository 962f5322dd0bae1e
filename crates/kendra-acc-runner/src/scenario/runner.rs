//! Scenario execution
//!
//! Steps run strictly in order and the first failure aborts the rest.
//! Teardown (destroy, then the destroy check) always runs afterwards, and
//! its failure is reported next to the step failure rather than replacing it.

use super::check::CheckContext;
use super::precheck::error_check;
use super::{Scenario, Step};
use crate::aws::IndexApi;
use crate::engine::ProvisioningEngine;
use crate::wait::WaitConfig;
use anyhow::{Context, Result, anyhow, bail};
use kendra_acc_common::assertions::{primary_id, verify_import};
use kendra_acc_common::defaults::{DEFAULT_DELETION_TIMEOUT_SECS, INDEX_RESOURCE_TYPE};
use kendra_acc_common::{AssertionError, State};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Runner settings shared by all scenarios
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Polling used when a check deletes the index itself
    pub deletion_wait: WaitConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            deletion_wait: WaitConfig::for_index_deletion(Duration::from_secs(
                DEFAULT_DELETION_TIMEOUT_SECS,
            )),
        }
    }
}

/// The step that stopped a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// 1-based step number
    pub step: usize,
    pub message: String,
}

/// Final result of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    Passed,
    Skipped {
        reason: String,
    },
    Failed {
        step: Option<StepFailure>,
        teardown: Option<String>,
    },
}

impl ScenarioOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ScenarioOutcome::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScenarioOutcome::Passed => "PASS",
            ScenarioOutcome::Skipped { .. } => "SKIP",
            ScenarioOutcome::Failed { .. } => "FAIL",
        }
    }
}

/// What happened when a scenario ran
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: ScenarioOutcome,
    pub steps_completed: usize,
    pub steps_total: usize,
    pub duration_secs: f64,
}

impl ScenarioReport {
    /// Report for a scenario that never started
    pub fn skipped(scenario: &Scenario, reason: impl Into<String>) -> Self {
        Self {
            name: scenario.name.clone(),
            outcome: ScenarioOutcome::Skipped {
                reason: reason.into(),
            },
            steps_completed: 0,
            steps_total: scenario.steps.len(),
            duration_secs: 0.0,
        }
    }

    /// Report for a scenario whose engine could not be set up
    pub fn setup_failed(scenario: &Scenario, error: impl fmt::Display) -> Self {
        Self {
            name: scenario.name.clone(),
            outcome: ScenarioOutcome::Failed {
                step: Some(StepFailure {
                    step: 1,
                    message: format!("Failed to set up scenario: {error}"),
                }),
                teardown: None,
            },
            steps_completed: 0,
            steps_total: scenario.steps.len(),
            duration_secs: 0.0,
        }
    }
}

/// Runs scenarios against one engine workspace and the index API
pub struct ScenarioRunner<E, A> {
    engine: E,
    api: A,
    config: RunnerConfig,
}

impl<E: ProvisioningEngine, A: IndexApi> ScenarioRunner<E, A> {
    pub fn new(engine: E, api: A, config: RunnerConfig) -> Self {
        Self {
            engine,
            api,
            config,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run every step, then tear down.
    pub async fn run(&self, scenario: &Scenario) -> ScenarioReport {
        let start = Instant::now();
        let name = scenario.name.as_str();
        info!(scenario = %name, steps = scenario.steps.len(), "Starting scenario");

        // `applied` feeds imports; `attempted` feeds teardown, since a failed
        // apply can still leave resources in state.
        let mut applied: Option<&str> = None;
        let mut attempted: Option<&str> = None;
        let mut completed = 0;
        let mut failure = None;

        for (i, step) in scenario.steps.iter().enumerate() {
            let number = i + 1;
            debug!(scenario = %name, step = number, "Running step");
            if let Some(config) = step.config() {
                attempted = Some(config);
            }
            match self.run_step(step, &mut applied).await {
                Ok(()) => {
                    completed += 1;
                    info!(scenario = %name, step = number, "Step passed");
                }
                Err(e) => {
                    let message = format!("{e:#}");
                    error!(scenario = %name, step = number, error = %message, "Step failed");
                    failure = Some(StepFailure {
                        step: number,
                        message,
                    });
                    break;
                }
            }
        }

        let teardown = match self.teardown(attempted).await {
            Ok(()) => None,
            Err(e) => {
                let message = format!("{e:#}");
                error!(scenario = %name, error = %message, "Teardown failed");
                Some(message)
            }
        };

        let outcome = match (failure, teardown) {
            (None, None) => ScenarioOutcome::Passed,
            (Some(f), None) => match error_check(&f.message) {
                Some(reason) => {
                    warn!(scenario = %name, reason = %reason, "Skipping scenario");
                    ScenarioOutcome::Skipped { reason }
                }
                None => ScenarioOutcome::Failed {
                    step: Some(f),
                    teardown: None,
                },
            },
            (step, teardown) => ScenarioOutcome::Failed { step, teardown },
        };

        let duration = start.elapsed();
        info!(
            scenario = %name,
            outcome = outcome.label(),
            duration_secs = duration.as_secs(),
            "Scenario finished"
        );

        ScenarioReport {
            name: scenario.name.clone(),
            outcome,
            steps_completed: completed,
            steps_total: scenario.steps.len(),
            duration_secs: duration.as_secs_f64(),
        }
    }

    fn check_context<'a>(&'a self, state: &'a State) -> CheckContext<'a, A> {
        CheckContext {
            state,
            api: &self.api,
            deletion_wait: self.config.deletion_wait.clone(),
        }
    }

    async fn run_step<'s>(&self, step: &'s Step, applied: &mut Option<&'s str>) -> Result<()> {
        match step {
            Step::Apply {
                config,
                checks,
                expect_non_empty_plan,
            } => {
                self.engine.apply(config).await.context("Applying configuration")?;
                *applied = Some(config.as_str());

                let state = self.engine.state().await.context("Reading state after apply")?;
                let ctx = self.check_context(&state);
                for check in checks {
                    debug!(check = %check, "Running check");
                    check.run(&ctx).await.with_context(|| format!("Check failed: {check}"))?;
                }

                let plan = self.engine.plan(config).await.context("Planning after apply")?;
                match (plan.has_changes, *expect_non_empty_plan) {
                    (true, false) => bail!("After applying this test step, the plan was not empty."),
                    (false, true) => bail!("Expected a non-empty plan, but got an empty plan"),
                    _ => Ok(()),
                }
            }
            Step::Import {
                address,
                verify,
                verify_ignore,
                checks,
            } => {
                let config = applied
                    .ok_or_else(|| anyhow!("Import step for {address} has no applied configuration"))?;

                let state = self.engine.state().await.context("Reading state before import")?;
                let id = primary_id(&state, address)?;
                let imported = self
                    .engine
                    .import(config, address, id)
                    .await
                    .with_context(|| format!("Importing {address} ({id})"))?;

                if *verify {
                    let recorded = state.resource(address).ok_or_else(|| {
                        AssertionError::ResourceNotFound {
                            address: address.clone(),
                        }
                    })?;
                    let imported = imported.resource(address).ok_or_else(|| {
                        AssertionError::ResourceNotFound {
                            address: address.clone(),
                        }
                    })?;
                    let ignore: Vec<&str> = verify_ignore.iter().map(String::as_str).collect();
                    verify_import(recorded, imported, &ignore)?;
                }

                let ctx = self.check_context(&imported);
                for check in checks {
                    debug!(check = %check, "Running check");
                    check.run(&ctx).await.with_context(|| format!("Check failed: {check}"))?;
                }
                Ok(())
            }
        }
    }

    /// Destroy, then verify no index from the pre-destroy state survives.
    ///
    /// Destroy runs whenever an apply was attempted and the state is not
    /// known to be empty. If the state cannot be read, destroy still runs and
    /// only the destroy check is skipped.
    async fn teardown(&self, attempted: Option<&str>) -> Result<()> {
        let Some(config) = attempted else {
            debug!("Nothing applied; skipping destroy");
            return Ok(());
        };

        let state = match self.engine.state().await {
            Ok(state) if state.is_empty() => {
                debug!("State is empty; skipping destroy");
                return Ok(());
            }
            Ok(state) => Ok(state),
            Err(e) => {
                warn!(error = %e, "Could not read state before destroy; destroying anyway");
                Err(anyhow::Error::new(e).context("Reading state before destroy"))
            }
        };

        let destroyed = self.engine.destroy(config).await.context("Destroying resources");
        let verified = match &state {
            Ok(state) => check_destroyed(state, &self.api).await,
            Err(_) => Ok(()),
        };

        let errors: Vec<String> = [state.err(), destroyed.err(), verified.err()]
            .into_iter()
            .flatten()
            .map(|e| format!("{e:#}"))
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            bail!("{}", errors.join("; "))
        }
    }
}

/// Fail if any index recorded in `state` still resolves to the same id.
///
/// Describe errors of any kind count as deleted.
pub async fn check_destroyed<A: IndexApi>(state: &State, api: &A) -> Result<()> {
    for resource in state.resources_of_type(INDEX_RESOURCE_TYPE) {
        let Some(id) = resource.id() else { continue };

        match api.describe_index(id).await {
            Ok(snapshot) if snapshot.id == id => {
                bail!("Index '{id}' was not deleted properly");
            }
            Ok(_) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => {
                warn!(
                    index_id = %id,
                    error = %e,
                    "Describe failed during destroy check; treating as deleted"
                );
            }
        }
    }
    Ok(())
}
