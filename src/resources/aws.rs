//! Resource enumeration
//!
//! Lists each resource kind through the provider, one kind after another.
//! Each kind is fault-isolated: a failure is recorded on that kind's
//! inventory and enumeration moves on to the next kind.

use crate::provider::{ApiFailure, ResourceProvider};
use crate::resources::types::{Inventory, KindInventory, Resource, ResourceKind};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// What to enumerate besides the four core kinds
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Lowercase fragments; a bucket is priced when its name contains one
    pub bucket_keywords: Vec<String>,
    pub api_gateway: bool,
    /// Show spinners on stderr while listing
    pub progress: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            bucket_keywords: crate::config::DEFAULT_BUCKET_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            api_gateway: true,
            progress: false,
        }
    }
}

impl ScanSettings {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            bucket_keywords: config
                .scan
                .bucket_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            api_gateway: config.scan.api_gateway,
            progress: false,
        }
    }

    pub fn matches_bucket(&self, bucket: &str) -> bool {
        let name = bucket.to_lowercase();
        self.bucket_keywords.iter().any(|k| name.contains(k.as_str()))
    }
}

fn spinner(enabled: bool, message: &str) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn record(kind: ResourceKind, result: Result<Vec<Resource>, ApiFailure>) -> KindInventory {
    match result {
        Ok(resources) => {
            info!("Found {} {}", resources.len(), kind.label());
            KindInventory {
                resources,
                ..KindInventory::default()
            }
        }
        Err(e) => {
            warn!("Could not list {}: {}", kind.label(), e);
            KindInventory::failed(e)
        }
    }
}

/// Enumerate every resource kind
pub async fn enumerate(provider: &dyn ResourceProvider, settings: &ScanSettings) -> Inventory {
    debug!("Enumerating resources via {}", provider.name());

    let pb = spinner(settings.progress, "Scanning SageMaker endpoints...");
    let endpoints = record(ResourceKind::Endpoint, provider.list_endpoints().await);

    pb.set_message("Scanning training jobs...");
    let training_jobs = record(ResourceKind::TrainingJob, provider.list_training_jobs().await);

    pb.set_message("Scanning notebook instances...");
    let notebook_instances = record(
        ResourceKind::NotebookInstance,
        provider.list_notebook_instances().await,
    );

    pb.set_message("Scanning S3 storage...");
    let buckets = enumerate_buckets(provider, settings).await;

    let api_gateways = if settings.api_gateway {
        pb.set_message("Scanning API Gateways...");
        let result = provider.list_api_gateways().await;
        if let Err(e) = &result {
            warn!("Could not list API Gateways: {}", e);
        }
        Some(result)
    } else {
        None
    };

    pb.finish_and_clear();

    Inventory {
        endpoints,
        training_jobs,
        notebook_instances,
        buckets,
        api_gateways,
    }
}

/// List buckets, keep the ML-related ones and size each of them
///
/// A bucket that cannot be sized (wrong region, denied) is left out with a
/// warning; it does not fail the whole kind.
async fn enumerate_buckets(provider: &dyn ResourceProvider, settings: &ScanSettings) -> KindInventory {
    let records = match provider.list_buckets().await {
        Ok(records) => records,
        Err(e) => {
            warn!("Could not list buckets: {}", e);
            return KindInventory::failed(e);
        }
    };

    let mut inventory = KindInventory::default();
    for record in records.into_iter().filter(|b| settings.matches_bucket(&b.name)) {
        match provider.bucket_usage(&record.name).await {
            Ok(usage) => {
                debug!(
                    "Bucket {}: {} bytes in {} objects",
                    record.name, usage.size_bytes, usage.object_count
                );
                inventory.resources.push(
                    Resource::bucket(record.name, usage.size_bytes, usage.object_count)
                        .with_created_at(record.created_at),
                );
            }
            Err(e) => {
                warn!("Could not analyze bucket {}: {}", record.name, e);
                inventory
                    .warnings
                    .push(format!("Could not analyze bucket {}: {}", record.name, e));
            }
        }
    }
    info!("Found {} storage buckets", inventory.resources.len());
    inventory
}
