//! Run report writing and summary display

use crate::config::RunConfig;
use crate::scenario::{ScenarioOutcome, ScenarioReport};
use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use std::path::Path;
use tracing::info;

/// Build the JSON document written by `--output`
pub fn results_json(config: &RunConfig, reports: &[ScenarioReport]) -> serde_json::Value {
    serde_json::json!({
        "region": config.aws.region,
        "provider_version": config.engine.provider_version,
        "written_at": chrono::Utc::now().to_rfc3339(),
        "success": !any_failed(reports),
        "scenarios": reports,
    })
}

/// Write the JSON report to `path`
pub async fn write_results(
    path: &Path,
    config: &RunConfig,
    reports: &[ScenarioReport],
) -> Result<()> {
    let output = results_json(config, reports);
    tokio::fs::write(path, serde_json::to_string_pretty(&output)?)
        .await
        .with_context(|| format!("Failed to write results to {}", path.display()))?;
    info!(path = %path.display(), "Results written");
    Ok(())
}

pub fn any_failed(reports: &[ScenarioReport]) -> bool {
    reports.iter().any(|r| r.outcome.is_failure())
}

fn detail(outcome: &ScenarioOutcome) -> String {
    match outcome {
        ScenarioOutcome::Passed => String::new(),
        ScenarioOutcome::Skipped { reason } => reason.clone(),
        ScenarioOutcome::Failed { step, teardown } => {
            let mut parts = Vec::new();
            if let Some(f) = step {
                parts.push(format!("step {}: {}", f.step, f.message));
            }
            if let Some(t) = teardown {
                parts.push(format!("teardown: {t}"));
            }
            parts.join("\n")
        }
    }
}

/// Render the summary table
pub fn summary_table(reports: &[ScenarioReport]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Scenario"),
            Cell::new("Result"),
            Cell::new("Steps"),
            Cell::new("Duration (s)"),
            Cell::new("Detail"),
        ]);

    for report in reports {
        let color = match report.outcome {
            ScenarioOutcome::Passed => Color::Green,
            ScenarioOutcome::Skipped { .. } => Color::Yellow,
            ScenarioOutcome::Failed { .. } => Color::Red,
        };
        table.add_row(vec![
            Cell::new(&report.name),
            Cell::new(report.outcome.label()).fg(color),
            Cell::new(format!("{}/{}", report.steps_completed, report.steps_total)),
            Cell::new(format!("{:.1}", report.duration_secs)),
            Cell::new(detail(&report.outcome)),
        ]);
    }

    table
}

/// Print the summary table to stdout
pub fn print_summary(reports: &[ScenarioReport]) {
    if reports.is_empty() {
        return;
    }
    println!("\n=== Scenario Results ===\n");
    println!("{}", summary_table(reports));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::StepFailure;

    fn report(name: &str, outcome: ScenarioOutcome) -> ScenarioReport {
        ScenarioReport {
            name: name.into(),
            outcome,
            steps_completed: 2,
            steps_total: 3,
            duration_secs: 12.34,
        }
    }

    fn reports() -> Vec<ScenarioReport> {
        vec![
            report("basic", ScenarioOutcome::Passed),
            report(
                "disappears",
                ScenarioOutcome::Failed {
                    step: Some(StepFailure {
                        step: 2,
                        message: "Not found: aws_kendra_index.test".into(),
                    }),
                    teardown: Some("Index 'idx-1' was not deleted properly".into()),
                },
            ),
        ]
    }

    #[test]
    fn table_lists_every_scenario() {
        let rendered = summary_table(&reports()).to_string();
        assert!(rendered.contains("basic"));
        assert!(rendered.contains("PASS"));
        assert!(rendered.contains("FAIL"));
        assert!(rendered.contains("2/3"));
        assert!(rendered.contains("12.3"));
    }

    #[test]
    fn failure_detail_shows_step_and_teardown() {
        let d = detail(&reports()[1].outcome);
        assert!(d.contains("step 2: Not found"));
        assert!(d.contains("teardown: Index 'idx-1'"));
    }

    #[test]
    fn any_failed_ignores_skips() {
        let skipped = vec![report(
            "basic",
            ScenarioOutcome::Skipped {
                reason: "no Kendra".into(),
            },
        )];
        assert!(!any_failed(&skipped));
        assert!(any_failed(&reports()));
    }
}
