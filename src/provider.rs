//! Provider trait for the cloud account being scanned
//!
//! The scan pipeline, the cost estimator and the cleanup executor only talk to
//! AWS through `ResourceProvider`. `providers::aws_provider::AwsProvider` is the
//! real implementation; tests drive the same pipeline with mocks and fakes.
//!
//! Every method returns `ApiResult`, whose error is a classified `ApiFailure`
//! rather than an SDK error, so callers can record failures per resource kind
//! (or per resource during cleanup) without aborting the run.

use crate::resources::types::{ApiGatewayInventory, Resource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for a single provider call
pub type ApiResult<T> = std::result::Result<T, ApiFailure>;

/// Why a provider call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureCategory {
    AccessDenied,
    Throttled,
    Network,
    MissingRegion,
    Credentials,
    NotFound,
    Other,
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureCategory::AccessDenied => "access denied",
            FailureCategory::Throttled => "throttled",
            FailureCategory::Network => "network",
            FailureCategory::MissingRegion => "missing region",
            FailureCategory::Credentials => "credentials",
            FailureCategory::NotFound => "not found",
            FailureCategory::Other => "api error",
        };
        f.write_str(s)
    }
}

/// A failed provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{operation} failed ({category}): {message}")]
pub struct ApiFailure {
    pub operation: String,
    pub category: FailureCategory,
    pub message: String,
}

impl ApiFailure {
    pub fn new(
        operation: impl Into<String>,
        category: FailureCategory,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            category,
            message: message.into(),
        }
    }
}

/// A bucket as returned by the listing call, before it is sized
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRecord {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Total size of every object in a bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketUsage {
    pub size_bytes: u64,
    pub object_count: u64,
}

/// Access to the chargeable resources of one account and region
///
/// List calls must return complete results, following continuation tokens
/// until the provider reports no further pages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Provider name (e.g., "aws")
    fn name(&self) -> &'static str;

    /// Account id of the resolved credentials; fails when there are none
    async fn caller_account(&self) -> ApiResult<Option<String>>;

    /// Every endpoint, in any status, with its production variants
    async fn list_endpoints(&self) -> ApiResult<Vec<Resource>>;

    /// Training jobs that are currently in progress
    async fn list_training_jobs(&self) -> ApiResult<Vec<Resource>>;

    /// Every notebook instance, in any status
    async fn list_notebook_instances(&self) -> ApiResult<Vec<Resource>>;

    /// Every bucket visible to the caller
    async fn list_buckets(&self) -> ApiResult<Vec<BucketRecord>>;

    /// Sum of object sizes in one bucket
    async fn bucket_usage(&self, bucket: &str) -> ApiResult<BucketUsage>;

    /// REST, HTTP and WebSocket APIs with their stages
    async fn list_api_gateways(&self) -> ApiResult<ApiGatewayInventory>;

    async fn delete_endpoint(&self, name: &str) -> ApiResult<()>;

    async fn delete_endpoint_config(&self, config_name: &str) -> ApiResult<()>;

    async fn stop_training_job(&self, name: &str) -> ApiResult<()>;

    async fn stop_notebook_instance(&self, name: &str) -> ApiResult<()>;
}

/// Classify an AWS error code (and message, when there is no code)
///
/// Requests that never reached AWS carry no code; their message is the only
/// hint whether the region or the credentials were missing.
pub fn classify_error(code: Option<&str>, message: &str) -> FailureCategory {
    if let Some(code) = code {
        return match code {
            "AccessDenied"
            | "AccessDeniedException"
            | "UnauthorizedOperation"
            | "UnauthorizedException"
            | "AuthorizationError"
            | "Forbidden"
            | "ForbiddenException" => FailureCategory::AccessDenied,
            "Throttling"
            | "ThrottlingException"
            | "TooManyRequestsException"
            | "RequestLimitExceeded"
            | "SlowDown" => FailureCategory::Throttled,
            "InvalidClientTokenId"
            | "ExpiredToken"
            | "ExpiredTokenException"
            | "SignatureDoesNotMatch"
            | "UnrecognizedClientException"
            | "InvalidAccessKeyId"
            | "MissingAuthenticationToken" => FailureCategory::Credentials,
            "ResourceNotFound" | "ResourceNotFoundException" | "NoSuchBucket" | "NotFoundException" => {
                FailureCategory::NotFound
            }
            // SageMaker reports unknown names as a validation error
            "ValidationException" if message.contains("Could not find") => FailureCategory::NotFound,
            _ => FailureCategory::Other,
        };
    }

    let lower = message.to_lowercase();
    if lower.contains("credential") {
        FailureCategory::Credentials
    } else if lower.contains("region") {
        FailureCategory::MissingRegion
    } else if lower.contains("dispatch")
        || lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connect")
        || lower.contains("dns")
    {
        FailureCategory::Network
    } else {
        FailureCategory::Other
    }
}
