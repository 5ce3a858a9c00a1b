use anyhow::{Context, Result};
use serde::Serialize;
use uuid::Uuid;
use vmhop_common::descriptor::InstanceSpec;
use vmhop_common::{MigrationOutcome, MigrationPlan, MigrationRequest};

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Serialize)]
struct OutcomeReport<'a> {
    run_id: Uuid,
    #[serde(flatten)]
    request: &'a MigrationRequest,
    #[serde(flatten)]
    spec: &'a InstanceSpec,
    instance_id: &'a str,
    lifecycle_state: Option<&'a str>,
}

#[derive(Serialize)]
struct PlanReport<'a> {
    dry_run: bool,
    #[serde(flatten)]
    spec: &'a InstanceSpec,
    command: Vec<&'a str>,
}

pub fn render_outcome(outcome: &MigrationOutcome, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!(
            "Successfully migrated {} to OCI. New instance ID is {}",
            outcome.request.source_name, outcome.instance.id,
        )),
        OutputFormat::Json => {
            let report = OutcomeReport {
                run_id: outcome.run_id,
                request: &outcome.request,
                spec: &outcome.spec,
                instance_id: &outcome.instance.id,
                lifecycle_state: outcome.instance.lifecycle_state.as_deref(),
            };
            serde_json::to_string_pretty(&report).context("Failed to serialize migration report")
        }
    }
}

pub fn render_plan(plan: &MigrationPlan, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format!("Dry run, would execute:\n  {}", plan.launch)),
        OutputFormat::Json => {
            let command = std::iter::once(plan.launch.program.as_str())
                .chain(plan.launch.args.iter().map(String::as_str))
                .collect();
            let report = PlanReport {
                dry_run: true,
                spec: &plan.spec,
                command,
            };
            serde_json::to_string_pretty(&report).context("Failed to serialize dry-run report")
        }
    }
}
