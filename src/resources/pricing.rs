//! Static price table and per-resource cost estimation
//!
//! Prices are approximate on-demand USD rates for us-east-1; the scanner does
//! not call the AWS Pricing API. A month is always 24 × 30 hours so monthly
//! figures stay comparable between runs and with earlier reports.

use crate::config::PricingConfig;
use crate::resources::types::{ApiGatewayApi, CostEstimate, Resource, ResourceKind};
use crate::utils::elapsed_hours;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub const HOURS_PER_DAY: f64 = 24.0;
/// Fixed 30-day month
pub const HOURS_PER_MONTH: f64 = HOURS_PER_DAY * 30.0;
pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
/// S3 Standard storage
pub const DEFAULT_STORAGE_RATE_PER_GB_MONTH: f64 = 0.023;
/// API Gateway REST stage cache, per cache GB per hour
pub const API_CACHE_RATE_PER_GB_HOUR: f64 = 0.02;
/// Cache size AWS assumes when a stage reports none
pub const DEFAULT_API_CACHE_SIZE_GB: f64 = 0.5;

/// Gap entry for a billing resource whose instance type is not known
pub const UNKNOWN_INSTANCE_TYPE: &str = "unknown instance type";

/// Built-in SageMaker hourly rates (USD per instance)
const BUILTIN_HOURLY_RATES: &[(&str, f64)] = &[
    ("ml.t3.medium", 0.05),
    ("ml.t3.large", 0.10),
    ("ml.m5.large", 0.12),
    ("ml.m5.xlarge", 0.23),
    ("ml.m5.2xlarge", 0.46),
    ("ml.m5.4xlarge", 0.93),
    ("ml.c5.xlarge", 0.20),
    ("ml.c5.2xlarge", 0.40),
    ("ml.c5.4xlarge", 0.81),
    ("ml.p3.2xlarge", 3.83),
    ("ml.g4dn.xlarge", 0.71),
    ("ml.g5.xlarge", 1.41),
    ("ml.g5.2xlarge", 2.03),
    ("ml.g5.4xlarge", 4.07),
    ("ml.inf1.xlarge", 0.36),
    ("ml.inf1.2xlarge", 0.58),
];

/// Instance type → hourly rate, plus the storage rate
///
/// Built once per run and shared read-only by every estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    hourly: HashMap<String, f64>,
    storage_per_gb_month: f64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PriceTable {
    pub fn builtin() -> Self {
        Self {
            hourly: BUILTIN_HOURLY_RATES
                .iter()
                .map(|(t, rate)| (t.to_string(), *rate))
                .collect(),
            storage_per_gb_month: DEFAULT_STORAGE_RATE_PER_GB_MONTH,
        }
    }

    /// Built-in table with the configured overrides applied
    pub fn from_config(pricing: &PricingConfig) -> Self {
        let mut table = Self::builtin();
        for (instance_type, rate) in &pricing.instance_overrides {
            table.hourly.insert(instance_type.clone(), *rate);
        }
        table.storage_per_gb_month = pricing.storage_per_gb_month;
        table
    }

    pub fn hourly_rate(&self, instance_type: &str) -> Option<f64> {
        self.hourly.get(instance_type).copied()
    }

    pub fn storage_rate(&self) -> f64 {
        self.storage_per_gb_month
    }

    /// Estimate the cost of one resource
    ///
    /// Status dominates: a resource that is not billing is all zeros and its
    /// instance types are not even looked up.
    pub fn estimate(&self, resource: &Resource, now: DateTime<Utc>) -> CostEstimate {
        if !resource.is_billing() {
            let mut zero = CostEstimate::default();
            if resource.kind == ResourceKind::TrainingJob {
                zero.cost_so_far = Some(0.0);
            }
            return zero;
        }

        match resource.kind {
            ResourceKind::Bucket => self.estimate_storage(resource),
            ResourceKind::Endpoint | ResourceKind::NotebookInstance => self.estimate_compute(resource),
            ResourceKind::TrainingJob => {
                let mut estimate = self.estimate_compute(resource);
                match resource.started_at {
                    Some(start) => {
                        let hours = elapsed_hours(start, now);
                        estimate.elapsed_hours = Some(hours);
                        estimate.cost_so_far = Some(estimate.hourly * hours);
                    }
                    None => estimate.cost_so_far = Some(0.0),
                }
                estimate
            }
        }
    }

    fn estimate_compute(&self, resource: &Resource) -> CostEstimate {
        let mut hourly = 0.0;
        let mut unpriced_types = Vec::new();

        for allocation in &resource.instances {
            match self.hourly_rate(&allocation.instance_type) {
                Some(rate) => hourly += rate * allocation.count as f64,
                None => {
                    if !unpriced_types.contains(&allocation.instance_type) {
                        unpriced_types.push(allocation.instance_type.clone());
                    }
                }
            }
        }

        // No allocations at all: the instance type could not be described
        if resource.instances.is_empty() {
            unpriced_types.push(UNKNOWN_INSTANCE_TYPE.to_string());
        }

        if !unpriced_types.is_empty() {
            tracing::debug!(
                "No price for {} on {} {}",
                unpriced_types.join(", "),
                resource.kind,
                resource.name
            );
        }

        CostEstimate {
            hourly,
            daily: hourly * HOURS_PER_DAY,
            monthly: hourly * HOURS_PER_MONTH,
            elapsed_hours: None,
            cost_so_far: None,
            pricing_gap: !unpriced_types.is_empty(),
            unpriced_types,
        }
    }

    fn estimate_storage(&self, resource: &Resource) -> CostEstimate {
        let size_gb = resource.size_bytes.unwrap_or(0) as f64 / BYTES_PER_GB;
        CostEstimate {
            monthly: size_gb * self.storage_rate(),
            ..CostEstimate::default()
        }
    }

    /// Monthly cost of a REST API stage cache
    pub fn api_cache_monthly(&self, api: &ApiGatewayApi) -> f64 {
        if api.cache_enabled {
            api.cache_size_gb * API_CACHE_RATE_PER_GB_HOUR * HOURS_PER_MONTH
        } else {
            0.0
        }
    }
}
