//! SageMaker cost scanning and cleanup
//!
//! One invocation is a straight pipeline: check credentials, enumerate,
//! price, render, then optionally confirm, clean up and report savings.

pub mod aws;
pub mod cleanup;
pub mod json;
pub mod pricing;
pub mod summary;
pub mod types;

use crate::aws_utils::{load_sdk_config, resolve_region};
use crate::config::Config;
use crate::error::{Result, SmcostError};
use crate::error_helpers::{missing_credentials, missing_region};
use crate::exit_codes::codes;
use crate::provider::{FailureCategory, ResourceProvider};
use crate::providers::AwsProvider;
use aws::{enumerate, ScanSettings};
use chrono::{DateTime, Utc};
use pricing::PriceTable;
use std::io::Write;
use tracing::{info, warn};
use types::{CleanupOutcome, ScanReport};

/// What one invocation should do
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub region: Option<String>,
    pub json: bool,
    pub cleanup: bool,
    pub assume_yes: bool,
    pub skip_api_gateway: bool,
    /// Spinners on stderr while enumerating
    pub progress: bool,
}

/// Verify credentials, enumerate everything and price it
pub async fn scan(
    provider: &dyn ResourceProvider,
    region: &str,
    settings: &ScanSettings,
    prices: &PriceTable,
    now: DateTime<Utc>,
) -> Result<ScanReport> {
    let account_id = match provider.caller_account().await {
        Ok(account) => account,
        Err(failure) => {
            return Err(match failure.category {
                FailureCategory::MissingRegion => missing_region(failure.to_string()),
                FailureCategory::Credentials | FailureCategory::AccessDenied => {
                    missing_credentials(format!("Could not verify AWS credentials: {}", failure))
                }
                _ => SmcostError::Aws {
                    message: format!("Could not reach AWS to verify credentials: {}", failure),
                },
            });
        }
    };
    info!(
        "Scanning region {} for account {}",
        region,
        account_id.as_deref().unwrap_or("unknown")
    );

    let inventory = enumerate(provider, settings).await;
    Ok(summary::build_report(region, account_id, inventory, prices, now))
}

/// Exit code for a finished report
pub fn exit_code(report: &ScanReport) -> i32 {
    if report.all_kinds_failed() {
        codes::SYSTEM_ERROR
    } else {
        codes::SUCCESS
    }
}

/// Scan, render and (when asked) clean up, writing the report to `out`
///
/// Text mode writes the scan report before asking for confirmation and the
/// cleanup outcome after it. JSON mode writes one document at the end.
pub async fn run<W: Write>(
    provider: &dyn ResourceProvider,
    region: &str,
    settings: &ScanSettings,
    prices: &PriceTable,
    opts: &RunOptions,
    now: DateTime<Utc>,
    out: &mut W,
) -> Result<i32> {
    let mut report = scan(provider, region, settings, prices, now).await?;

    if !opts.json {
        write!(out, "{}", summary::render_text(&report))?;
    }

    if opts.cleanup {
        if !report.has_billing_compute() {
            if !opts.json {
                writeln!(out, "\nNo active compute resources, no cleanup needed.")?;
            }
            report.cleanup = Some(CleanupOutcome {
                actions: Vec::new(),
                savings: types::Savings::default(),
            });
        } else if cleanup::confirm_cleanup(report.totals.hourly, opts.assume_yes)? {
            let outcome = cleanup::execute_cleanup(provider, &report).await;
            if outcome.failures().count() > 0 {
                warn!("{} cleanup actions failed", outcome.failures().count());
            }
            if !opts.json {
                write!(out, "{}", cleanup::render_outcome_text(&outcome))?;
            }
            report.cleanup = Some(outcome);
        } else if !opts.json {
            writeln!(out, "\nCleanup cancelled.")?;
        }
    }

    if opts.json {
        writeln!(out, "{}", json::render_json(&report)?)?;
    }
    out.flush()?;

    Ok(exit_code(&report))
}

/// Resolve the region, connect to AWS and run against the real account
pub async fn handle_command(opts: &RunOptions, config: &Config) -> Result<i32> {
    let region = resolve_region(opts.region.as_deref(), config.region.as_deref()).await?;
    let sdk_config = load_sdk_config(&region).await?;
    let provider = AwsProvider::new(&sdk_config);

    let mut settings = ScanSettings::from_config(config);
    if opts.skip_api_gateway {
        settings.api_gateway = false;
    }
    settings.progress = opts.progress;
    let prices = PriceTable::from_config(&config.pricing);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&provider, &region, &settings, &prices, opts, Utc::now(), &mut out).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ApiFailure, MockResourceProvider};
    use crate::resources::types::{ApiGatewayInventory, Resource, ResourceKind};

    fn empty_account(mock: &mut MockResourceProvider) {
        account_with_endpoints(mock, Vec::new());
    }

    fn account_with_endpoints(mock: &mut MockResourceProvider, endpoints: Vec<Resource>) {
        mock.expect_name().return_const("mock");
        mock.expect_list_endpoints()
            .returning(move || Ok(endpoints.clone()));
        mock.expect_list_training_jobs().returning(|| Ok(vec![]));
        mock.expect_list_notebook_instances().returning(|| Ok(vec![]));
        mock.expect_list_buckets().returning(|| Ok(vec![]));
        mock.expect_list_api_gateways()
            .returning(|| Ok(ApiGatewayInventory::default()));
    }

    #[tokio::test]
    async fn test_rejected_credentials_abort_before_enumeration() {
        let mut mock = MockResourceProvider::new();
        mock.expect_caller_account().times(1).returning(|| {
            Err(ApiFailure::new(
                "GetCallerIdentity",
                FailureCategory::Credentials,
                "The security token included in the request is invalid",
            ))
        });
        mock.expect_list_endpoints().never();

        let err = scan(
            &mock,
            "us-east-1",
            &ScanSettings::default(),
            &PriceTable::builtin(),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert_eq!(
            crate::exit_codes::exit_code_for_error(&err),
            codes::CREDENTIALS_ERROR
        );
        assert!(err.to_string().contains("aws configure"));
    }

    #[tokio::test]
    async fn test_empty_account_exits_zero() {
        let mut mock = MockResourceProvider::new();
        mock.expect_caller_account()
            .returning(|| Ok(Some("123456789012".to_string())));
        empty_account(&mut mock);

        let mut out = Vec::new();
        let code = run(
            &mock,
            "us-east-1",
            &ScanSettings::default(),
            &PriceTable::builtin(),
            &RunOptions::default(),
            Utc::now(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(code, codes::SUCCESS);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("No endpoints found"));
        assert!(text.contains("$0.00/hour"));
    }

    #[tokio::test]
    async fn test_cleanup_with_nothing_billing_makes_no_calls() {
        let mut mock = MockResourceProvider::new();
        mock.expect_caller_account().returning(|| Ok(None));
        empty_account(&mut mock);
        mock.expect_delete_endpoint().never();
        mock.expect_stop_training_job().never();
        mock.expect_stop_notebook_instance().never();

        let opts = RunOptions {
            cleanup: true,
            json: true,
            ..RunOptions::default()
        };
        let mut out = Vec::new();
        let code = run(
            &mock,
            "us-east-1",
            &ScanSettings::default(),
            &PriceTable::builtin(),
            &opts,
            Utc::now(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(code, codes::SUCCESS);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["cleanup"]["actions"].as_array().map(|a| a.len()), Some(0));
    }

    #[tokio::test]
    async fn test_network_failure_is_not_a_credentials_error() {
        let mut mock = MockResourceProvider::new();
        mock.expect_caller_account().times(1).returning(|| {
            Err(ApiFailure::new(
                "GetCallerIdentity",
                FailureCategory::Network,
                "dispatch failure: io error: connection refused",
            ))
        });
        mock.expect_list_endpoints().never();

        let err = scan(
            &mock,
            "us-east-1",
            &ScanSettings::default(),
            &PriceTable::builtin(),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert_eq!(
            crate::exit_codes::exit_code_for_error(&err),
            codes::SYSTEM_ERROR
        );
        assert!(!err.to_string().contains("aws configure"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_access_denied_on_identity_check_is_a_credentials_error() {
        let mut mock = MockResourceProvider::new();
        mock.expect_caller_account().returning(|| {
            Err(ApiFailure::new(
                "GetCallerIdentity",
                FailureCategory::AccessDenied,
                "not authorized",
            ))
        });

        let err = scan(
            &mock,
            "us-east-1",
            &ScanSettings::default(),
            &PriceTable::builtin(),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert_eq!(
            crate::exit_codes::exit_code_for_error(&err),
            codes::CREDENTIALS_ERROR
        );
    }

    #[tokio::test]
    async fn test_cleanup_deletes_endpoint_with_unpriced_instance_type() {
        let mut mock = MockResourceProvider::new();
        mock.expect_caller_account().returning(|| Ok(None));
        account_with_endpoints(
            &mut mock,
            vec![Resource::compute(ResourceKind::Endpoint, "g6-endpoint", "InService")
                .with_instances("ml.g6.xlarge", 1)
                .with_config_name(Some("cfg".to_string()))],
        );
        mock.expect_delete_endpoint()
            .withf(|name: &str| name == "g6-endpoint")
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_delete_endpoint_config()
            .withf(|name: &str| name == "cfg")
            .times(1)
            .returning(|_| Ok(()));

        let opts = RunOptions {
            cleanup: true,
            assume_yes: true,
            json: true,
            ..RunOptions::default()
        };
        let mut out = Vec::new();
        let code = run(
            &mock,
            "us-east-1",
            &ScanSettings::default(),
            &PriceTable::builtin(),
            &opts,
            Utc::now(),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(code, codes::SUCCESS);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["cleanup"]["actions"][0]["status"], "deleted");
        assert_eq!(value["cleanup"]["savings"]["hourly"].as_f64(), Some(0.0));
    }
}
