//! Report building and the text projection of a scan

use crate::provider::ApiFailure;
use crate::resources::pricing::{PriceTable, HOURS_PER_DAY, HOURS_PER_MONTH};
use crate::resources::types::{
    ApiGatewaySection, CostTotals, Inventory, KindInventory, KindSection, PricedResource,
    ResourceKind, ScanReport,
};
use crate::utils::{format_gb, format_runtime};
use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use console::style;
use std::fmt;

/// Hourly spend above which the summary turns red
const HOURLY_WARNING_THRESHOLD: f64 = 10.0;

fn price_section(
    kind: ResourceKind,
    inventory: KindInventory,
    prices: &PriceTable,
    now: DateTime<Utc>,
) -> KindSection {
    let resources = inventory
        .resources
        .into_iter()
        .map(|resource| {
            let cost = prices.estimate(&resource, now);
            PricedResource { resource, cost }
        })
        .collect();
    KindSection {
        kind,
        resources,
        error: inventory.error,
        warnings: inventory.warnings,
    }
}

fn price_api_gateways(
    result: Result<crate::resources::types::ApiGatewayInventory, ApiFailure>,
    prices: &PriceTable,
) -> ApiGatewaySection {
    match result {
        Ok(inventory) => {
            let apis: Vec<_> = inventory
                .apis
                .into_iter()
                .map(|mut api| {
                    api.cache_monthly_cost = prices.api_cache_monthly(&api);
                    api
                })
                .collect();
            let monthly_cost = apis.iter().fold(0.0, |acc, a| acc + a.cache_monthly_cost);
            ApiGatewaySection {
                apis,
                monthly_cost,
                error: None,
                warnings: inventory.warnings,
            }
        }
        Err(error) => ApiGatewaySection {
            apis: Vec::new(),
            monthly_cost: 0.0,
            error: Some(error),
            warnings: Vec::new(),
        },
    }
}

/// Grand totals over priced sections
///
/// Folds from positive zero so an empty section never renders as `-0.00`.
///
/// Only billing compute resources enter the hourly figure. Storage and API
/// Gateway caches are monthly-only and never reach hourly or daily.
pub fn compute_totals(
    compute: &[&KindSection],
    buckets: &KindSection,
    api_gateways: Option<&ApiGatewaySection>,
) -> CostTotals {
    let hourly: f64 = compute
        .iter()
        .filter(|s| s.kind.is_compute())
        .flat_map(|s| s.active())
        .fold(0.0, |acc, r| acc + r.cost.hourly);
    let monthly_storage = buckets.active().fold(0.0, |acc, r| acc + r.cost.monthly);
    let monthly_api_gateway = api_gateways.map(|a| a.monthly_cost).unwrap_or(0.0);
    let monthly_compute = hourly * HOURS_PER_MONTH;

    CostTotals {
        hourly,
        daily: hourly * HOURS_PER_DAY,
        monthly_compute,
        monthly_storage,
        monthly_api_gateway,
        monthly: monthly_compute + monthly_storage + monthly_api_gateway,
    }
}

/// Price every enumerated resource and aggregate the report
pub fn build_report(
    region: &str,
    account_id: Option<String>,
    inventory: Inventory,
    prices: &PriceTable,
    now: DateTime<Utc>,
) -> ScanReport {
    let endpoints = price_section(ResourceKind::Endpoint, inventory.endpoints, prices, now);
    let training_jobs = price_section(ResourceKind::TrainingJob, inventory.training_jobs, prices, now);
    let notebook_instances = price_section(
        ResourceKind::NotebookInstance,
        inventory.notebook_instances,
        prices,
        now,
    );
    let buckets = price_section(ResourceKind::Bucket, inventory.buckets, prices, now);
    let api_gateways = inventory
        .api_gateways
        .map(|result| price_api_gateways(result, prices));

    let totals = compute_totals(
        &[&endpoints, &training_jobs, &notebook_instances],
        &buckets,
        api_gateways.as_ref(),
    );

    ScanReport {
        region: region.to_string(),
        account_id,
        scanned_at: now,
        endpoints,
        training_jobs,
        notebook_instances,
        buckets,
        api_gateways,
        totals,
        cleanup: None,
    }
}

/// Render the report as text
pub fn render_text(report: &ScanReport) -> String {
    TextReport(report).to_string()
}

/// Text projection of a `ScanReport`
pub struct TextReport<'a>(pub &'a ScanReport);

impl TextReport<'_> {
    fn section_header(
        f: &mut fmt::Formatter<'_>,
        title: &str,
        section: &KindSection,
        noun: &str,
    ) -> fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "{} ({} {})",
            style(title).bold(),
            section.resources.len(),
            noun
        )?;
        writeln!(f, "{}", "-".repeat(50))?;
        if let Some(error) = &section.error {
            writeln!(
                f,
                "  {} could not list {}: {}",
                style("ERROR:").red().bold(),
                section.kind.label(),
                error
            )?;
        }
        for warning in &section.warnings {
            writeln!(f, "  {} {}", style("WARNING:").yellow(), warning)?;
        }
        Ok(())
    }

    fn status_line(f: &mut fmt::Formatter<'_>, priced: &PricedResource) -> fmt::Result {
        let status = if priced.resource.is_billing() {
            style(priced.resource.status.as_str()).green()
        } else {
            style(priced.resource.status.as_str()).red()
        };
        writeln!(f, "  {} [{}]", priced.resource.name, status)
    }

    fn instances_line(f: &mut fmt::Formatter<'_>, priced: &PricedResource) -> fmt::Result {
        for allocation in &priced.resource.instances {
            writeln!(f, "    {} x{}", allocation.instance_type, allocation.count)?;
        }
        if priced.cost.pricing_gap {
            writeln!(
                f,
                "    {} no price for {} (counted as $0.00)",
                style("NOTE:").yellow(),
                priced.cost.unpriced_types.join(", ")
            )?;
        }
        Ok(())
    }

    fn endpoints(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let section = &self.0.endpoints;
        Self::section_header(f, "ENDPOINTS", section, "found")?;
        if section.resources.is_empty() && section.error.is_none() {
            writeln!(f, "  No endpoints found")?;
        }
        for priced in &section.resources {
            Self::status_line(f, priced)?;
            writeln!(
                f,
                "    Cost: ${:.2}/hour | ${:.2}/day | ${:.2}/month",
                priced.cost.hourly, priced.cost.daily, priced.cost.monthly
            )?;
            Self::instances_line(f, priced)?;
        }
        Ok(())
    }

    fn training_jobs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let section = &self.0.training_jobs;
        Self::section_header(f, "TRAINING JOBS", section, "active")?;
        if section.resources.is_empty() && section.error.is_none() {
            writeln!(f, "  No active training jobs found")?;
        }
        for priced in &section.resources {
            Self::status_line(f, priced)?;
            writeln!(f, "    Cost: ${:.2}/hour", priced.cost.hourly)?;
            if let (Some(hours), Some(runtime)) = (
                priced.cost.elapsed_hours,
                format_runtime(priced.resource.started_at, self.0.scanned_at),
            ) {
                writeln!(f, "    Running for: {:.2} hours ({})", hours, runtime)?;
            }
            writeln!(
                f,
                "    Cost so far: ${:.3}",
                priced.cost.cost_so_far.unwrap_or(0.0)
            )?;
            Self::instances_line(f, priced)?;
        }
        Ok(())
    }

    fn notebooks(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let section = &self.0.notebook_instances;
        Self::section_header(f, "NOTEBOOK INSTANCES", section, "found")?;
        if section.resources.is_empty() && section.error.is_none() {
            writeln!(f, "  No notebook instances found")?;
        }
        for priced in &section.resources {
            Self::status_line(f, priced)?;
            writeln!(
                f,
                "    Cost: ${:.2}/hour | ${:.2}/day",
                priced.cost.hourly, priced.cost.daily
            )?;
            Self::instances_line(f, priced)?;
        }
        Ok(())
    }

    fn buckets(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let section = &self.0.buckets;
        Self::section_header(f, "S3 STORAGE", section, "ML buckets")?;
        if section.resources.is_empty() && section.error.is_none() {
            writeln!(f, "  No ML-related buckets found")?;
        }
        for priced in &section.resources {
            writeln!(f, "  {}", priced.resource.name)?;
            writeln!(
                f,
                "    Size: {} ({} objects)",
                format_gb(priced.resource.size_bytes.unwrap_or(0)),
                priced.resource.object_count.unwrap_or(0)
            )?;
            writeln!(f, "    Monthly cost: ${:.2}", priced.cost.monthly)?;
        }
        Ok(())
    }

    fn api_gateways(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(section) = &self.0.api_gateways else {
            return Ok(());
        };
        writeln!(f)?;
        writeln!(
            f,
            "{} ({} APIs found)",
            style("API GATEWAY").bold(),
            section.apis.len()
        )?;
        writeln!(f, "{}", "-".repeat(50))?;
        if let Some(error) = &section.error {
            writeln!(
                f,
                "  {} could not list API Gateways: {}",
                style("ERROR:").red().bold(),
                error
            )?;
        }
        for warning in &section.warnings {
            writeln!(f, "  {} {}", style("WARNING:").yellow(), warning)?;
        }
        if section.apis.is_empty() && section.error.is_none() {
            writeln!(f, "  No API Gateway APIs found")?;
            return Ok(());
        }
        for api in &section.apis {
            writeln!(f, "  {} ({})", api.name, api.protocol)?;
            writeln!(f, "    ID: {}", api.id)?;
            let stages = if api.stages.is_empty() {
                "None".to_string()
            } else {
                api.stages.join(", ")
            };
            writeln!(f, "    Stages: {}", stages)?;
            if api.cache_enabled {
                writeln!(
                    f,
                    "    Cache cost: ${:.2}/month ({} GB)",
                    api.cache_monthly_cost, api.cache_size_gb
                )?;
            }
        }
        writeln!(
            f,
            "  Request charges depend on traffic and are not estimated (REST $3.50, HTTP $1.00 per million)"
        )
    }

    fn summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let totals = &self.0.totals;
        writeln!(f)?;
        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(f, "{}", style("COST SUMMARY").bold())?;
        writeln!(f, "{}", "=".repeat(80))?;

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Charge", "Estimate"]);
        table.add_row(vec![
            Cell::new("Active compute"),
            Cell::new(format!("${:.2}/hour", totals.hourly)),
        ]);
        table.add_row(vec![
            Cell::new("Daily compute"),
            Cell::new(format!("${:.2}", totals.daily)),
        ]);
        table.add_row(vec![
            Cell::new("Monthly compute"),
            Cell::new(format!("${:.2}", totals.monthly_compute)),
        ]);
        table.add_row(vec![
            Cell::new("Monthly storage"),
            Cell::new(format!("${:.2}", totals.monthly_storage)),
        ]);
        if totals.monthly_api_gateway > 0.0 {
            table.add_row(vec![
                Cell::new("Monthly API Gateway cache"),
                Cell::new(format!("${:.2}", totals.monthly_api_gateway)),
            ]);
        }
        table.add_row(vec![
            Cell::new("TOTAL MONTHLY"),
            Cell::new(format!("${:.2}", totals.monthly)),
        ]);
        writeln!(f, "{}", table)?;

        if totals.hourly > 0.0 {
            let label = if totals.hourly > HOURLY_WARNING_THRESHOLD {
                style("WARNING:").red().bold()
            } else {
                style("WARNING:").yellow().bold()
            };
            writeln!(f)?;
            writeln!(
                f,
                "{} You have ${:.2}/hour in active charges (~${:.0}/month if left running)",
                label, totals.hourly, totals.monthly_compute
            )?;
            writeln!(f, "   Run 'smcost --cleanup' to stop them.")?;
        }
        Ok(())
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(f, "{}", style("SAGEMAKER COST SCAN").bold().cyan())?;
        writeln!(f, "{}", "=".repeat(80))?;
        writeln!(f, "Region:    {}", report.region)?;
        if let Some(account) = &report.account_id {
            writeln!(f, "Account:   {}", account)?;
        }
        writeln!(
            f,
            "Scan time: {}",
            report.scanned_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;

        self.endpoints(f)?;
        self.training_jobs(f)?;
        self.notebooks(f)?;
        self.buckets(f)?;
        self.api_gateways(f)?;
        self.summary(f)
    }
}
