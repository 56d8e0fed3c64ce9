//! End-to-end scan against a real AWS account
//!
//! Read-only: only the scan runs, never cleanup.
//! Run with: SMCOST_E2E=1 cargo test --test aws_scan_e2e_test --features e2e -- --ignored

#![cfg(feature = "e2e")]

use chrono::Utc;
use smcost::aws_utils::{load_sdk_config, resolve_region};
use smcost::providers::AwsProvider;
use smcost::resources::aws::ScanSettings;
use smcost::resources::pricing::PriceTable;
use smcost::resources::scan;
use std::env;

/// Check if E2E tests should run (require explicit opt-in)
fn should_run_e2e() -> bool {
    env::var("SMCOST_E2E").is_ok() || env::var("CI").is_ok()
}

#[tokio::test]
#[ignore] // Requires AWS credentials and explicit opt-in
async fn test_scan_real_account() {
    if !should_run_e2e() {
        eprintln!("Skipping E2E test. Set SMCOST_E2E=1 to run");
        return;
    }

    let region = resolve_region(None, None).await.expect("no AWS region configured");
    let sdk_config = load_sdk_config(&region).await.expect("no AWS credentials");
    let provider = AwsProvider::new(&sdk_config);

    let report = scan(
        &provider,
        &region,
        &ScanSettings::default(),
        &PriceTable::builtin(),
        Utc::now(),
    )
    .await
    .expect("scan failed");

    println!(
        "{}: {} endpoints, {} training jobs, {} notebooks, {} buckets, ${:.2}/hour",
        region,
        report.endpoints.resources.len(),
        report.training_jobs.resources.len(),
        report.notebook_instances.resources.len(),
        report.buckets.resources.len(),
        report.totals.hourly
    );

    assert!(report.account_id.is_some());
    assert!(report.totals.hourly >= 0.0);
    assert!(
        (report.totals.monthly
            - (report.totals.monthly_compute
                + report.totals.monthly_storage
                + report.totals.monthly_api_gateway))
            .abs()
            < 1e-6
    );
}
