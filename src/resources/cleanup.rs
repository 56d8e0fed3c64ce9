//! Cleanup of billing SageMaker resources
//!
//! Works from the resources of a finished scan: in-service endpoints are
//! deleted, in-progress training jobs and in-service notebooks are stopped.
//! Storage and API Gateways are never touched. Each call stands alone, so a
//! failure is recorded on its resource and the remaining calls still run.

use crate::error::Result;
use crate::provider::ResourceProvider;
use crate::resources::types::{
    CleanupAction, CleanupOutcome, CleanupStatus, PricedResource, ResourceKind, Savings,
    ScanReport,
};
use console::style;
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::{info, warn};

/// Ask before deleting anything that is billing
///
/// Returns `true` without prompting when `assume_yes` is set or stdin is not
/// a terminal.
pub fn confirm_cleanup(hourly: f64, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        warn!("stdin is not a terminal, proceeding with cleanup without confirmation");
        return Ok(true);
    }
    let stdin = io::stdin();
    confirm_with(stdin.lock(), io::stderr(), hourly)
}

fn confirm_with<R: BufRead, W: Write>(mut input: R, mut prompt: W, hourly: f64) -> Result<bool> {
    write!(
        prompt,
        "Delete/stop resources costing ${:.2}/hour? (yes/no): ",
        hourly
    )?;
    prompt.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn action(priced: &PricedResource, status: CleanupStatus) -> CleanupAction {
    CleanupAction {
        kind: priced.resource.kind,
        name: priced.resource.name.clone(),
        status,
        notes: Vec::new(),
    }
}

fn skipped(priced: &PricedResource) -> CleanupAction {
    action(
        priced,
        CleanupStatus::Skipped {
            reason: format!("status is {}", priced.resource.status),
        },
    )
}

async fn cleanup_endpoint(provider: &dyn ResourceProvider, priced: &PricedResource) -> CleanupAction {
    let resource = &priced.resource;
    if !resource.is_billing() {
        return skipped(priced);
    }

    info!("Deleting endpoint {}", resource.name);
    if let Err(e) = provider.delete_endpoint(&resource.name).await {
        warn!("Failed to delete endpoint {}: {}", resource.name, e);
        return action(priced, CleanupStatus::Failed { error: e });
    }

    let mut deleted = action(priced, CleanupStatus::Deleted);
    if let Some(config_name) = &resource.config_name {
        match provider.delete_endpoint_config(config_name).await {
            Ok(()) => info!("Deleted endpoint config {}", config_name),
            Err(e) => {
                warn!("Endpoint config {} not deleted: {}", config_name, e);
                deleted.notes.push(format!(
                    "endpoint config {} was not deleted (it may be shared): {}",
                    config_name, e.message
                ));
            }
        }
    }
    deleted
}

async fn stop_resource(provider: &dyn ResourceProvider, priced: &PricedResource) -> CleanupAction {
    let resource = &priced.resource;
    if !resource.is_billing() {
        return skipped(priced);
    }

    let result = match resource.kind {
        ResourceKind::TrainingJob => {
            info!("Stopping training job {}", resource.name);
            provider.stop_training_job(&resource.name).await
        }
        ResourceKind::NotebookInstance => {
            info!("Stopping notebook instance {}", resource.name);
            provider.stop_notebook_instance(&resource.name).await
        }
        ResourceKind::Endpoint | ResourceKind::Bucket => return skipped(priced),
    };

    match result {
        Ok(()) => action(priced, CleanupStatus::Stopped),
        Err(e) => {
            warn!("Failed to stop {} {}: {}", resource.kind, resource.name, e);
            action(priced, CleanupStatus::Failed { error: e })
        }
    }
}

/// Delete or stop every billing compute resource in the report
///
/// Savings are the report's pre-cleanup compute totals; the resources are
/// gone afterwards, so a re-scan would only ever show zero.
pub async fn execute_cleanup(provider: &dyn ResourceProvider, report: &ScanReport) -> CleanupOutcome {
    let mut actions = Vec::new();

    for priced in &report.endpoints.resources {
        actions.push(cleanup_endpoint(provider, priced).await);
    }
    for priced in &report.training_jobs.resources {
        actions.push(stop_resource(provider, priced).await);
    }
    for priced in &report.notebook_instances.resources {
        actions.push(stop_resource(provider, priced).await);
    }

    let outcome = CleanupOutcome {
        actions,
        savings: Savings {
            hourly: report.totals.hourly,
            daily: report.totals.daily,
            monthly: report.totals.monthly_compute,
        },
    };
    info!(
        "Cleanup finished: {} actions, {} failed",
        outcome.actions.len(),
        outcome.failures().count()
    );
    outcome
}

pub fn render_outcome_text(outcome: &CleanupOutcome) -> String {
    CleanupText(outcome).to_string()
}

/// Text projection of a `CleanupOutcome`
pub struct CleanupText<'a>(pub &'a CleanupOutcome);

impl fmt::Display for CleanupText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.0;
        writeln!(f)?;
        writeln!(f, "{}", style("CLEANUP").bold())?;
        writeln!(f, "{}", "-".repeat(50))?;
        if outcome.actions.is_empty() {
            writeln!(f, "  Nothing to clean up")?;
        }

        for action in &outcome.actions {
            match &action.status {
                CleanupStatus::Deleted => {
                    writeln!(f, "  {} {} {}", style("Deleted").green(), action.kind, action.name)?
                }
                CleanupStatus::Stopped => {
                    writeln!(f, "  {} {} {}", style("Stopped").green(), action.kind, action.name)?
                }
                CleanupStatus::Skipped { reason } => writeln!(
                    f,
                    "  {} {} {} ({})",
                    style("Skipped").dim(),
                    action.kind,
                    action.name,
                    reason
                )?,
                CleanupStatus::Failed { error } => writeln!(
                    f,
                    "  {} {} {}: {}",
                    style("FAILED").red().bold(),
                    action.kind,
                    action.name,
                    error
                )?,
            }
            for note in &action.notes {
                writeln!(f, "    {} {}", style("NOTE:").yellow(), note)?;
            }
        }

        writeln!(f, "  Storage buckets and API Gateways were left untouched")?;
        writeln!(f)?;
        writeln!(f, "{}", style("ESTIMATED SAVINGS").bold())?;
        writeln!(
            f,
            "  ${:.2}/hour | ${:.2}/day | ${:.2}/month",
            outcome.savings.hourly, outcome.savings.daily, outcome.savings.monthly
        )
    }
}
