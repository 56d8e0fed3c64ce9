//! AWS implementation of `ResourceProvider`
//!
//! One client per service, all built from the same `SdkConfig`. List calls
//! follow continuation tokens until AWS stops returning one.

use crate::aws_utils::{api_failure, text, Present, PresentValue};
use crate::provider::{ApiResult, BucketRecord, BucketUsage, FailureCategory, ResourceProvider};
use crate::resources::pricing::DEFAULT_API_CACHE_SIZE_GB;
use crate::resources::types::{
    ApiGatewayApi, ApiGatewayInventory, ApiProtocol, Resource, ResourceKind,
};
use crate::utils::smithy_to_chrono;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_apigateway::Client as ApiGatewayClient;
use aws_sdk_apigatewayv2::Client as ApiGatewayV2Client;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sagemaker::types::TrainingJobStatus;
use aws_sdk_sagemaker::Client as SageMakerClient;
use aws_sdk_sts::Client as StsClient;
use tracing::{debug, warn};

/// AWS provider for SageMaker, S3 and API Gateway
pub struct AwsProvider {
    sagemaker: SageMakerClient,
    s3: S3Client,
    sts: StsClient,
    apigateway: ApiGatewayClient,
    apigatewayv2: ApiGatewayV2Client,
    /// Region the scan targets; bucket listing is limited to it
    region: Option<String>,
}

impl AwsProvider {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            sagemaker: SageMakerClient::new(sdk_config),
            s3: S3Client::new(sdk_config),
            sts: StsClient::new(sdk_config),
            apigateway: ApiGatewayClient::new(sdk_config),
            apigatewayv2: ApiGatewayV2Client::new(sdk_config),
            region: sdk_config.region().map(|r| r.as_ref().to_string()),
        }
    }

    /// Status, timestamps and production variants of one endpoint
    ///
    /// `None` when the endpoint disappeared after it was listed.
    async fn describe_endpoint(&self, name: &str) -> ApiResult<Option<Resource>> {
        let described = match self
            .sagemaker
            .describe_endpoint()
            .endpoint_name(name)
            .send()
            .await
        {
            Ok(out) => out,
            Err(e) => {
                let failure = api_failure("DescribeEndpoint", e);
                if failure.category == FailureCategory::NotFound {
                    debug!("Endpoint {} vanished before it could be described", name);
                    return Ok(None);
                }
                return Err(failure);
            }
        };

        let status = text(described.endpoint_status()).unwrap_or_else(|| "Unknown".to_string());
        let config_name = text(described.endpoint_config_name());
        let mut resource = Resource::compute(ResourceKind::Endpoint, name, status)
            .with_arn(text(described.endpoint_arn()))
            .with_config_name(config_name.clone())
            .with_created_at(described.creation_time().present().and_then(smithy_to_chrono));

        let Some(config_name) = config_name else {
            return Ok(Some(resource));
        };

        match self
            .sagemaker
            .describe_endpoint_config()
            .endpoint_config_name(&config_name)
            .send()
            .await
        {
            Ok(config) => {
                for variant in config.production_variants() {
                    match text(variant.instance_type()) {
                        Some(instance_type) => {
                            let count = variant
                                .initial_instance_count()
                                .present_value()
                                .unwrap_or(1)
                                .max(0) as u32;
                            resource = resource.with_instances(instance_type, count);
                        }
                        // Serverless variants have no instance type
                        None => debug!("Endpoint {} has a serverless variant", name),
                    }
                }
            }
            Err(e) => {
                let failure = api_failure("DescribeEndpointConfig", e);
                warn!(
                    "Could not describe endpoint config {} of {}: {}",
                    config_name, name, failure
                );
            }
        }
        Ok(Some(resource))
    }

    /// Instance configuration and start time of one training job
    async fn describe_training_job(&self, name: &str) -> ApiResult<Option<Resource>> {
        let described = match self
            .sagemaker
            .describe_training_job()
            .training_job_name(name)
            .send()
            .await
        {
            Ok(out) => out,
            Err(e) => {
                let failure = api_failure("DescribeTrainingJob", e);
                if failure.category == FailureCategory::NotFound {
                    return Ok(None);
                }
                return Err(failure);
            }
        };

        let status = text(described.training_job_status()).unwrap_or_else(|| "Unknown".to_string());
        let mut resource = Resource::compute(ResourceKind::TrainingJob, name, status)
            .with_arn(text(described.training_job_arn()))
            .with_created_at(described.creation_time().present().and_then(smithy_to_chrono))
            .with_started_at(
                described
                    .training_start_time()
                    .present()
                    .and_then(smithy_to_chrono),
            );

        if let Some(config) = described.resource_config().present() {
            if let Some(instance_type) = text(config.instance_type()) {
                let count = config.instance_count().present_value().unwrap_or(1).max(0) as u32;
                resource = resource.with_instances(instance_type, count);
            }
            // Heterogeneous clusters describe their instances per group
            for group in config.instance_groups() {
                if let Some(instance_type) = text(group.instance_type()) {
                    let count = group.instance_count().present_value().unwrap_or(1).max(0) as u32;
                    resource = resource.with_instances(instance_type, count);
                }
            }
        }
        Ok(Some(resource))
    }

    async fn rest_apis(&self) -> ApiResult<(Vec<ApiGatewayApi>, Vec<String>)> {
        let mut apis = Vec::new();
        let mut warnings = Vec::new();
        let mut position: Option<String> = None;

        loop {
            let page = self
                .apigateway
                .get_rest_apis()
                .set_position(position.take())
                .send()
                .await
                .map_err(|e| api_failure("GetRestApis", e))?;

            for item in page.items() {
                let Some(id) = text(item.id()) else { continue };
                let mut api = ApiGatewayApi {
                    name: text(item.name()).unwrap_or_else(|| id.clone()),
                    id,
                    protocol: ApiProtocol::Rest,
                    description: text(item.description()),
                    created_at: item.created_date().present().and_then(smithy_to_chrono),
                    stages: Vec::new(),
                    cache_enabled: false,
                    cache_size_gb: 0.0,
                    cache_monthly_cost: 0.0,
                };

                match self.apigateway.get_stages().rest_api_id(&api.id).send().await {
                    Ok(stages) => {
                        for stage in stages.item() {
                            if let Some(stage_name) = text(stage.stage_name()) {
                                api.stages.push(stage_name);
                            }
                            let cached = stage.cache_cluster_enabled().present_value().unwrap_or(false);
                            if cached && !api.cache_enabled {
                                api.cache_enabled = true;
                                api.cache_size_gb = text(stage.cache_cluster_size())
                                    .and_then(|s| s.parse::<f64>().ok())
                                    .unwrap_or(DEFAULT_API_CACHE_SIZE_GB);
                            }
                        }
                    }
                    Err(e) => {
                        let failure = api_failure("GetStages", e);
                        warnings.push(format!("Could not list stages of {}: {}", api.name, failure));
                    }
                }
                apis.push(api);
            }

            position = page.position().map(str::to_string);
            if position.is_none() {
                break;
            }
        }
        Ok((apis, warnings))
    }

    async fn v2_apis(&self) -> ApiResult<(Vec<ApiGatewayApi>, Vec<String>)> {
        let mut apis = Vec::new();
        let mut warnings = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .apigatewayv2
                .get_apis()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_failure("GetApis", e))?;

            for item in page.items() {
                let Some(id) = text(item.api_id()) else { continue };
                let protocol = match text(item.protocol_type()).as_deref() {
                    Some("WEBSOCKET") => ApiProtocol::WebSocket,
                    _ => ApiProtocol::Http,
                };
                let mut api = ApiGatewayApi {
                    name: text(item.name()).unwrap_or_else(|| id.clone()),
                    id,
                    protocol,
                    description: text(item.description()),
                    created_at: item.created_date().present().and_then(smithy_to_chrono),
                    stages: Vec::new(),
                    cache_enabled: false,
                    cache_size_gb: 0.0,
                    cache_monthly_cost: 0.0,
                };

                match self.apigatewayv2.get_stages().api_id(&api.id).send().await {
                    Ok(stages) => {
                        api.stages = stages
                            .items()
                            .iter()
                            .filter_map(|s| text(s.stage_name()))
                            .collect();
                    }
                    Err(e) => {
                        let failure = api_failure("GetStages", e);
                        warnings.push(format!("Could not list stages of {}: {}", api.name, failure));
                    }
                }
                apis.push(api);
            }

            next_token = page.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok((apis, warnings))
    }
}

#[async_trait]
impl ResourceProvider for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    async fn caller_account(&self) -> ApiResult<Option<String>> {
        let identity = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| api_failure("GetCallerIdentity", e))?;
        Ok(identity.account().map(str::to_string))
    }

    async fn list_endpoints(&self) -> ApiResult<Vec<Resource>> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .sagemaker
                .list_endpoints()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_failure("ListEndpoints", e))?;
            names.extend(page.endpoints().iter().filter_map(|e| text(e.endpoint_name())));
            next_token = page.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        let mut endpoints = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(endpoint) = self.describe_endpoint(name).await? {
                endpoints.push(endpoint);
            }
        }
        Ok(endpoints)
    }

    async fn list_training_jobs(&self) -> ApiResult<Vec<Resource>> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .sagemaker
                .list_training_jobs()
                .status_equals(TrainingJobStatus::InProgress)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_failure("ListTrainingJobs", e))?;
            names.extend(
                page.training_job_summaries()
                    .iter()
                    .filter_map(|j| text(j.training_job_name())),
            );
            next_token = page.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        let mut jobs = Vec::with_capacity(names.len());
        for name in &names {
            if let Some(job) = self.describe_training_job(name).await? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    async fn list_notebook_instances(&self) -> ApiResult<Vec<Resource>> {
        let mut notebooks = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .sagemaker
                .list_notebook_instances()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| api_failure("ListNotebookInstances", e))?;

            for summary in page.notebook_instances() {
                let Some(name) = text(summary.notebook_instance_name()) else {
                    continue;
                };
                let status = text(summary.notebook_instance_status())
                    .unwrap_or_else(|| "Unknown".to_string());
                let mut notebook = Resource::compute(ResourceKind::NotebookInstance, name, status)
                    .with_arn(text(summary.notebook_instance_arn()))
                    .with_created_at(summary.creation_time().present().and_then(smithy_to_chrono));
                if let Some(instance_type) = text(summary.instance_type()) {
                    notebook = notebook.with_instances(instance_type, 1);
                }
                notebooks.push(notebook);
            }

            next_token = page.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }
        Ok(notebooks)
    }

    async fn list_buckets(&self) -> ApiResult<Vec<BucketRecord>> {
        let mut buckets = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .s3
                .list_buckets()
                .set_bucket_region(self.region.clone())
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| api_failure("ListBuckets", e))?;
            buckets.extend(page.buckets().iter().filter_map(|b| {
                text(b.name()).map(|name| BucketRecord {
                    name,
                    created_at: b.creation_date().present().and_then(smithy_to_chrono),
                })
            }));
            continuation = page.continuation_token().map(str::to_string);
            if continuation.is_none() {
                break;
            }
        }
        Ok(buckets)
    }

    async fn bucket_usage(&self, bucket: &str) -> ApiResult<BucketUsage> {
        let mut usage = BucketUsage::default();
        let mut continuation: Option<String> = None;
        loop {
            let page = self
                .s3
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| api_failure("ListObjectsV2", e))?;

            for object in page.contents() {
                usage.size_bytes += object.size().unwrap_or(0).max(0) as u64;
                usage.object_count += 1;
            }

            let truncated = page.is_truncated().present_value().unwrap_or(false);
            continuation = page.next_continuation_token().map(str::to_string);
            if !truncated || continuation.is_none() {
                break;
            }
        }
        Ok(usage)
    }

    async fn list_api_gateways(&self) -> ApiResult<ApiGatewayInventory> {
        let rest = self.rest_apis().await;
        let v2 = self.v2_apis().await;

        let mut inventory = ApiGatewayInventory::default();
        match (rest, v2) {
            (Err(rest_err), Err(v2_err)) => {
                debug!("HTTP/WebSocket API listing also failed: {}", v2_err);
                return Err(rest_err);
            }
            (rest, v2) => {
                for (result, label) in [(rest, "REST"), (v2, "HTTP/WebSocket")] {
                    match result {
                        Ok((apis, warnings)) => {
                            inventory.apis.extend(apis);
                            inventory.warnings.extend(warnings);
                        }
                        Err(e) => inventory
                            .warnings
                            .push(format!("Could not list {} APIs: {}", label, e)),
                    }
                }
            }
        }
        Ok(inventory)
    }

    async fn delete_endpoint(&self, name: &str) -> ApiResult<()> {
        self.sagemaker
            .delete_endpoint()
            .endpoint_name(name)
            .send()
            .await
            .map_err(|e| api_failure("DeleteEndpoint", e))?;
        Ok(())
    }

    async fn delete_endpoint_config(&self, config_name: &str) -> ApiResult<()> {
        self.sagemaker
            .delete_endpoint_config()
            .endpoint_config_name(config_name)
            .send()
            .await
            .map_err(|e| api_failure("DeleteEndpointConfig", e))?;
        Ok(())
    }

    async fn stop_training_job(&self, name: &str) -> ApiResult<()> {
        self.sagemaker
            .stop_training_job()
            .training_job_name(name)
            .send()
            .await
            .map_err(|e| api_failure("StopTrainingJob", e))?;
        Ok(())
    }

    async fn stop_notebook_instance(&self, name: &str) -> ApiResult<()> {
        self.sagemaker
            .stop_notebook_instance()
            .notebook_instance_name(name)
            .send()
            .await
            .map_err(|e| api_failure("StopNotebookInstance", e))?;
        Ok(())
    }
}
