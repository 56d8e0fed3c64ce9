//! Type definitions for scanned resources and the scan report
//!
//! A `Resource` is a snapshot of one chargeable unit as the provider reported
//! it. The estimator attaches exactly one `CostEstimate` to it, and the
//! renderer works from the single `ScanReport` built out of those pairs.

use crate::provider::ApiFailure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four chargeable resource classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Endpoint,
    TrainingJob,
    NotebookInstance,
    Bucket,
}

impl ResourceKind {
    pub fn is_compute(self) -> bool {
        !matches!(self, ResourceKind::Bucket)
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Endpoint => "endpoints",
            ResourceKind::TrainingJob => "training jobs",
            ResourceKind::NotebookInstance => "notebook instances",
            ResourceKind::Bucket => "storage buckets",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceKind::Endpoint => "endpoint",
            ResourceKind::TrainingJob => "training-job",
            ResourceKind::NotebookInstance => "notebook",
            ResourceKind::Bucket => "bucket",
        };
        f.write_str(s)
    }
}

/// Provider status normalized across resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceState {
    InService,
    InProgress,
    Pending,
    Stopping,
    Stopped,
    Deleting,
    Failed,
    Completed,
    Available,
    Unknown,
}

impl ResourceState {
    /// Normalize a SageMaker status string (`InService`, `InProgress`, ...)
    pub fn from_status(status: &str) -> Self {
        match status {
            "InService" => ResourceState::InService,
            "InProgress" => ResourceState::InProgress,
            "Pending" | "Creating" | "Updating" | "SystemUpdating" | "RollingBack" => {
                ResourceState::Pending
            }
            "Stopping" => ResourceState::Stopping,
            "Stopped" | "OutOfService" => ResourceState::Stopped,
            "Deleting" => ResourceState::Deleting,
            "Failed" | "UpdateRollbackFailed" => ResourceState::Failed,
            "Completed" => ResourceState::Completed,
            "Available" => ResourceState::Available,
            _ => ResourceState::Unknown,
        }
    }
}

/// Instances of one type backing a compute resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceAllocation {
    pub instance_type: String,
    pub count: u32,
}

/// A discovered billable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    /// Status exactly as the provider reported it
    pub status: String,
    pub state: ResourceState,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<InstanceAllocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_count: Option<u64>,
    /// Endpoint configuration (endpoints only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// A compute resource (endpoint, training job, notebook) without instances yet
    pub fn compute(kind: ResourceKind, name: impl Into<String>, status: impl Into<String>) -> Self {
        let status = status.into();
        Self {
            kind,
            name: name.into(),
            arn: None,
            state: ResourceState::from_status(&status),
            status,
            instances: Vec::new(),
            size_bytes: None,
            object_count: None,
            config_name: None,
            created_at: None,
            started_at: None,
        }
    }

    /// A storage bucket of known size
    pub fn bucket(name: impl Into<String>, size_bytes: u64, object_count: u64) -> Self {
        Self {
            kind: ResourceKind::Bucket,
            name: name.into(),
            arn: None,
            status: "Available".to_string(),
            state: ResourceState::Available,
            instances: Vec::new(),
            size_bytes: Some(size_bytes),
            object_count: Some(object_count),
            config_name: None,
            created_at: None,
            started_at: None,
        }
    }

    pub fn with_instances(mut self, instance_type: impl Into<String>, count: u32) -> Self {
        self.instances.push(InstanceAllocation {
            instance_type: instance_type.into(),
            count,
        });
        self
    }

    pub fn with_arn(mut self, arn: Option<String>) -> Self {
        self.arn = arn;
        self
    }

    pub fn with_config_name(mut self, config_name: Option<String>) -> Self {
        self.config_name = config_name;
        self
    }

    pub fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_started_at(mut self, started_at: Option<DateTime<Utc>>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Whether the provider is charging for this resource right now
    ///
    /// Only in-service endpoints and notebooks, in-progress training jobs and
    /// stored bucket data bill. Everything else costs nothing.
    pub fn is_billing(&self) -> bool {
        matches!(
            (self.kind, self.state),
            (ResourceKind::Endpoint, ResourceState::InService)
                | (ResourceKind::TrainingJob, ResourceState::InProgress)
                | (ResourceKind::NotebookInstance, ResourceState::InService)
                | (ResourceKind::Bucket, ResourceState::Available)
        )
    }
}

/// Estimated cost of one resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub hourly: f64,
    pub daily: f64,
    pub monthly: f64,
    /// Hours since the training job started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_hours: Option<f64>,
    /// Cost accrued since the training job started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_so_far: Option<f64>,
    /// Set when an instance type had no known price
    pub pricing_gap: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unpriced_types: Vec<String>,
}

/// A resource with its estimate attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedResource {
    #[serde(flatten)]
    pub resource: Resource,
    pub cost: CostEstimate,
}

/// Output of enumerating one resource kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KindInventory {
    pub resources: Vec<Resource>,
    pub error: Option<ApiFailure>,
    /// Partial problems that did not fail the whole kind (e.g., one unreadable bucket)
    pub warnings: Vec<String>,
}

impl KindInventory {
    pub fn failed(error: ApiFailure) -> Self {
        Self {
            resources: Vec::new(),
            error: Some(error),
            warnings: Vec::new(),
        }
    }
}

/// Everything the enumerator found, before pricing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    pub endpoints: KindInventory,
    pub training_jobs: KindInventory,
    pub notebook_instances: KindInventory,
    pub buckets: KindInventory,
    /// `None` when API Gateway scanning is disabled
    pub api_gateways: Option<Result<ApiGatewayInventory, ApiFailure>>,
}

/// API Gateway flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiProtocol {
    Rest,
    Http,
    WebSocket,
}

impl fmt::Display for ApiProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApiProtocol::Rest => "REST API",
            ApiProtocol::Http => "HTTP API",
            ApiProtocol::WebSocket => "WebSocket API",
        };
        f.write_str(s)
    }
}

/// One API Gateway API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiGatewayApi {
    pub id: String,
    pub name: String,
    pub protocol: ApiProtocol,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub stages: Vec<String>,
    /// REST only: a stage has a cache cluster
    pub cache_enabled: bool,
    pub cache_size_gb: f64,
    pub cache_monthly_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiGatewayInventory {
    pub apis: Vec<ApiGatewayApi>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Priced resources of one kind, as shown in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindSection {
    pub kind: ResourceKind,
    pub resources: Vec<PricedResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl KindSection {
    /// Resources that are billing right now
    pub fn active(&self) -> impl Iterator<Item = &PricedResource> {
        self.resources.iter().filter(|r| r.resource.is_billing())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiGatewaySection {
    pub apis: Vec<ApiGatewayApi>,
    pub monthly_cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Grand totals of one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostTotals {
    /// Active compute charges per hour
    pub hourly: f64,
    pub daily: f64,
    pub monthly_compute: f64,
    pub monthly_storage: f64,
    pub monthly_api_gateway: f64,
    /// Compute + storage + API Gateway caches
    pub monthly: f64,
}

/// The aggregate of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub region: String,
    pub account_id: Option<String>,
    pub scanned_at: DateTime<Utc>,
    pub endpoints: KindSection,
    pub training_jobs: KindSection,
    pub notebook_instances: KindSection,
    pub buckets: KindSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_gateways: Option<ApiGatewaySection>,
    pub totals: CostTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupOutcome>,
}

impl ScanReport {
    pub fn sections(&self) -> [&KindSection; 4] {
        [
            &self.endpoints,
            &self.training_jobs,
            &self.notebook_instances,
            &self.buckets,
        ]
    }

    /// True when no resource kind could be listed at all
    pub fn all_kinds_failed(&self) -> bool {
        self.sections().iter().all(|s| s.error.is_some())
    }

    /// True when cleanup has something to delete or stop, priced or not
    pub fn has_billing_compute(&self) -> bool {
        [&self.endpoints, &self.training_jobs, &self.notebook_instances]
            .iter()
            .flat_map(|s| s.resources.iter())
            .any(|r| r.resource.is_billing())
    }
}

/// What cleanup did to one resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum CleanupStatus {
    Deleted,
    Stopped,
    /// Resource was not billing; no call was made
    Skipped { reason: String },
    Failed { error: ApiFailure },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupAction {
    pub kind: ResourceKind,
    pub name: String,
    #[serde(flatten)]
    pub status: CleanupStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Hourly, daily and monthly cost that cleanup removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Savings {
    pub hourly: f64,
    pub daily: f64,
    pub monthly: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupOutcome {
    pub actions: Vec<CleanupAction>,
    pub savings: Savings,
}

impl CleanupOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &CleanupAction> {
        self.actions
            .iter()
            .filter(|a| matches!(a.status, CleanupStatus::Failed { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_normalization() {
        assert_eq!(ResourceState::from_status("InService"), ResourceState::InService);
        assert_eq!(ResourceState::from_status("InProgress"), ResourceState::InProgress);
        assert_eq!(ResourceState::from_status("Creating"), ResourceState::Pending);
        assert_eq!(ResourceState::from_status("OutOfService"), ResourceState::Stopped);
        assert_eq!(ResourceState::from_status("Failed"), ResourceState::Failed);
        assert_eq!(ResourceState::from_status("Weird"), ResourceState::Unknown);
    }

    #[test]
    fn test_billing_depends_on_kind_and_state() {
        let endpoint = Resource::compute(ResourceKind::Endpoint, "ep", "InService");
        let failed = Resource::compute(ResourceKind::Endpoint, "ep", "Failed");
        let job = Resource::compute(ResourceKind::TrainingJob, "job", "InProgress");
        let stopped_nb = Resource::compute(ResourceKind::NotebookInstance, "nb", "Stopped");
        let bucket = Resource::bucket("sagemaker-data", 10, 1);

        assert!(endpoint.is_billing());
        assert!(!failed.is_billing());
        assert!(job.is_billing());
        assert!(!stopped_nb.is_billing());
        assert!(bucket.is_billing());
        // InService is meaningless for a training job
        assert!(!Resource::compute(ResourceKind::TrainingJob, "job", "InService").is_billing());
    }

    #[test]
    fn test_variants_accumulate_allocations() {
        let endpoint = Resource::compute(ResourceKind::Endpoint, "ep", "InService")
            .with_instances("ml.g5.xlarge", 2)
            .with_instances("ml.m5.large", 1);
        assert_eq!(endpoint.instances.len(), 2);
        assert_eq!(endpoint.instances[0].count, 2);
        assert_eq!(endpoint.instances[1].instance_type, "ml.m5.large");
    }

    #[test]
    fn test_cleanup_status_serializes_with_tag() {
        let action = CleanupAction {
            kind: ResourceKind::TrainingJob,
            name: "job".to_string(),
            status: CleanupStatus::Skipped {
                reason: "not running".to_string(),
            },
            notes: Vec::new(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "not running");
        assert_eq!(json["kind"], "training-job");
    }
}
