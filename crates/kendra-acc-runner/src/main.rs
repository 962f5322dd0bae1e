//! kendra-acc: acceptance scenario runner for the aws_kendra_index resource
//!
//! Runs each scenario in its own terraform working directory, checks the
//! results against the live Kendra API and prints a summary.

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};
use kendra_acc_common::defaults::{
    DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_DELETION_TIMEOUT_SECS, DEFAULT_PARALLEL,
    DEFAULT_PROPAGATION_DELAY_SECS, DEFAULT_PROVIDER_VERSION, DEFAULT_REGION,
    DEFAULT_TERRAFORM_BIN, RESOURCE_PREFIX,
};
use kendra_acc_runner::aws::{
    AwsContext, FromAwsContext, IamClient, KendraClient, SweepConfig, Sweeper,
};
use kendra_acc_runner::config::{self, RunConfig};
use kendra_acc_runner::engine::TerraformCli;
use kendra_acc_runner::report;
use kendra_acc_runner::scenario::{
    PreCheck, ScenarioKind, ScenarioReport, ScenarioRunner, ScenarioSettings, Step, pre_check,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "kendra-acc")]
#[command(about = "Acceptance scenarios for the aws_kendra_index Terraform resource")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

/// Arguments for the run command (extracted to reduce enum size)
#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Scenarios to run (default: all)
    #[arg(value_enum)]
    scenarios: Vec<ScenarioKind>,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    aws_profile: Option<String>,

    /// Path to the terraform binary
    #[arg(long, env = "TF_ACC_TERRAFORM_PATH", default_value = DEFAULT_TERRAFORM_BIN)]
    terraform: PathBuf,

    /// AWS provider version constraint
    #[arg(long, default_value = DEFAULT_PROVIDER_VERSION)]
    provider_version: String,

    /// Shared provider plugin cache directory
    #[arg(long, env = "TF_PLUGIN_CACHE_DIR")]
    plugin_cache_dir: Option<PathBuf>,

    /// Seconds to wait after creating IAM roles
    #[arg(long, default_value_t = DEFAULT_PROPAGATION_DELAY_SECS)]
    propagation_delay_secs: u64,

    /// Timeout for each terraform invocation in seconds
    #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS)]
    command_timeout_secs: u64,

    /// Timeout for out-of-band index deletion in seconds
    #[arg(long, default_value_t = DEFAULT_DELETION_TIMEOUT_SECS)]
    deletion_timeout_secs: u64,

    /// Number of scenarios to run concurrently
    #[arg(long, default_value_t = DEFAULT_PARALLEL)]
    parallel: usize,

    /// Keep terraform working directories after each scenario
    #[arg(long)]
    keep_workdir: bool,

    /// Output JSON file for results
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl From<RunArgs> for RunConfig {
    fn from(args: RunArgs) -> Self {
        let scenarios = if args.scenarios.is_empty() {
            ScenarioKind::all().to_vec()
        } else {
            args.scenarios
        };
        Self {
            aws: config::AwsConfig {
                region: args.region,
                aws_profile: args.aws_profile,
            },
            engine: config::EngineConfig {
                terraform: args.terraform,
                provider_version: args.provider_version,
                plugin_cache_dir: args.plugin_cache_dir,
                command_timeout_secs: args.command_timeout_secs,
                keep_workdir: args.keep_workdir,
            },
            scenario: config::ScenarioConfig {
                scenarios,
                propagation_delay_secs: args.propagation_delay_secs,
                deletion_timeout_secs: args.deletion_timeout_secs,
                parallel: args.parallel,
                output: args.output,
            },
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run acceptance scenarios against AWS
    Run(Box<RunArgs>),

    /// List available scenarios
    List,

    /// Print the configuration each step of a scenario applies
    Render {
        #[arg(value_enum)]
        scenario: ScenarioKind,

        /// AWS region written into the provider block
        #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
        region: String,
    },

    /// Delete leftover fixtures by name prefix
    Sweep {
        /// AWS region to sweep
        #[arg(long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
        region: String,

        /// AWS profile to use
        #[arg(long)]
        aws_profile: Option<String>,

        /// Name prefix of fixtures to delete
        #[arg(long, default_value = RESOURCE_PREFIX)]
        prefix: String,

        /// Timeout for each index deletion in seconds
        #[arg(long, default_value_t = DEFAULT_DELETION_TIMEOUT_SECS)]
        deletion_timeout_secs: u64,

        /// Actually delete resources (default is dry-run)
        #[arg(long)]
        execute: bool,
    },
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error(&e);
            std::process::exit(1);
        }
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }

    if std::env::var("RUST_BACKTRACE").is_err() {
        let _ = writeln!(
            stderr,
            "\n\x1b[2mSet RUST_BACKTRACE=1 for a detailed backtrace\x1b[0m"
        );
    } else {
        let backtrace = e.backtrace();
        if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
            let _ = writeln!(stderr, "\n\x1b[2mBacktrace:\x1b[0m\n{backtrace}");
        }
    }
}

const SDK_TARGETS: [&str; 5] = [
    "aws_config",
    "aws_smithy_runtime",
    "aws_sdk_kendra",
    "aws_sdk_iam",
    "aws_sdk_sts",
];

/// `RUST_LOG` when set, INFO otherwise. SDK targets stay at warn unless
/// `RUST_LOG` names them.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    let rust_log = rust_log.map(str::trim).filter(|s| !s.is_empty());
    let mut filter = EnvFilter::new(rust_log.unwrap_or("info"));
    for target in SDK_TARGETS {
        if rust_log.is_some_and(|s| s.contains(target)) {
            continue;
        }
        if let Ok(directive) = format!("{target}=warn").parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

fn init_tracing() {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();
}

/// Returns whether every scenario passed or was skipped
async fn run() -> Result<bool> {
    let args = Args::parse();
    init_tracing();

    match args.command {
        Command::Run(run_args) => {
            let config: RunConfig = (*run_args).into();
            config.validate()?;
            handle_run(config).await
        }
        Command::List => {
            for kind in ScenarioKind::all() {
                println!("{}", kind.as_str());
            }
            Ok(true)
        }
        Command::Render { scenario, region } => {
            handle_render(scenario, &region);
            Ok(true)
        }
        Command::Sweep {
            region,
            aws_profile,
            prefix,
            deletion_timeout_secs,
            execute,
        } => {
            handle_sweep(region, aws_profile, prefix, deletion_timeout_secs, execute).await?;
            Ok(true)
        }
    }
}

/// Handle the run command
async fn handle_run(config: RunConfig) -> Result<bool> {
    if let Some(profile) = &config.aws.aws_profile {
        info!(profile = %profile, "Using AWS profile");
    }

    let aws = AwsContext::with_profile(&config.aws.region, config.aws.aws_profile.as_deref()).await;
    let settings = config.scenario_settings();
    let scenarios: Vec<_> = config
        .scenario
        .scenarios
        .iter()
        .map(|kind| kind.build(&settings))
        .collect();

    info!(
        scenarios = ?config.scenario.scenarios,
        region = %config.aws.region,
        parallel = config.scenario.parallel,
        terraform = %config.engine.terraform.display(),
        "Starting scenario run"
    );

    let reports: Vec<ScenarioReport> = match pre_check(&aws).await? {
        PreCheck::Skip(reason) => scenarios
            .iter()
            .map(|s| ScenarioReport::skipped(s, reason.clone()))
            .collect(),
        PreCheck::Ready(_) => {
            let kendra = KendraClient::from_context(&aws);
            let config = &config;
            stream::iter(scenarios.iter())
                .map(|scenario| {
                    let kendra = kendra.clone();
                    async move {
                        let tf = config.terraform_config();
                        let engine = match TerraformCli::new(tf, &scenario.name) {
                            Ok(engine) => engine,
                            Err(e) => return ScenarioReport::setup_failed(scenario, e),
                        };
                        ScenarioRunner::new(engine, kendra, config.runner_config())
                            .run(scenario)
                            .await
                    }
                })
                .buffer_unordered(config.scenario.parallel)
                .collect()
                .await
        }
    };

    report::print_summary(&reports);
    if let Some(path) = &config.scenario.output {
        report::write_results(path, &config, &reports).await?;
    }

    Ok(!report::any_failed(&reports))
}

/// Handle the render command
fn handle_render(kind: ScenarioKind, region: &str) {
    let scenario = kind.build(&ScenarioSettings::default());
    println!(
        "{}",
        kendra_acc_common::hcl::provider_config(region, DEFAULT_PROVIDER_VERSION)
    );
    for (i, step) in scenario.steps.iter().enumerate() {
        match step {
            Step::Apply { config, checks, expect_non_empty_plan } => {
                println!("# --- step {}: apply ---", i + 1);
                println!("{config}");
                for check in checks {
                    println!("# check: {check}");
                }
                if *expect_non_empty_plan {
                    println!("# expect non-empty plan");
                }
            }
            Step::Import { address, verify, .. } => {
                println!("# --- step {}: import {address} (verify: {verify}) ---", i + 1);
            }
        }
        println!();
    }
}

/// Handle the sweep command
async fn handle_sweep(
    region: String,
    aws_profile: Option<String>,
    prefix: String,
    deletion_timeout_secs: u64,
    execute: bool,
) -> Result<()> {
    let mode = if execute { "EXECUTE" } else { "DRY-RUN" };
    info!(region = %region, prefix = %prefix, mode, "Sweeping leftover fixtures");

    let aws = AwsContext::with_profile(&region, aws_profile.as_deref()).await;
    let sweeper = Sweeper::new(KendraClient::from_context(&aws), IamClient::from_context(&aws));
    let config = SweepConfig {
        prefix,
        dry_run: !execute,
        deletion_timeout: Duration::from_secs(deletion_timeout_secs),
        cancel: CancellationToken::new(),
    };

    // Ctrl-C stops after the current deletion request
    let cancel = config.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, leaving remaining fixtures in place");
            cancel.cancel();
        }
    });

    let report = sweeper.sweep(&config).await?;

    println!("\n=== Sweep Report ===");
    println!("Mode: {}", mode);
    println!("Region: {}", region);
    println!();
    println!("Resources found: {}", report.total_found);
    println!("  Kendra Indexes: {}", report.indexes);
    println!("  IAM Roles:      {}", report.roles);
    println!();
    if execute {
        println!("Deleted: {}", report.deleted);
        println!("Failed:  {}", report.failed);
        if report.skipped > 0 {
            println!("Skipped: {} (interrupted)", report.skipped);
        }
    } else {
        println!("Skipped: {} (dry-run mode)", report.skipped);
        println!();
        println!("Run with --execute to actually delete resources.");
    }

    Ok(())
}
