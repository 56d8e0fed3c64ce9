//! Property tests for report totals
//!
//! Random inventories of all four kinds go through `build_report`; the grand
//! totals must always be derivable from the per-resource estimates.

use chrono::Utc;
use proptest::prelude::*;
use smcost::resources::pricing::{PriceTable, HOURS_PER_DAY, HOURS_PER_MONTH};
use smcost::resources::summary::build_report;
use smcost::resources::types::{Inventory, KindInventory, Resource, ResourceKind};

const STATUSES: &[&str] = &["InService", "InProgress", "Failed", "Stopped", "Creating"];
const TYPES: &[&str] = &["ml.t3.medium", "ml.g5.xlarge", "ml.p3.2xlarge", "ml.x9.unknown"];

fn compute_resource(kind: ResourceKind) -> impl Strategy<Value = Resource> {
    (
        0..STATUSES.len(),
        0..TYPES.len(),
        1u32..4,
        "[a-z]{3,8}",
    )
        .prop_map(move |(status, instance_type, count, name)| {
            Resource::compute(kind, name, STATUSES[status]).with_instances(TYPES[instance_type], count)
        })
}

fn bucket() -> impl Strategy<Value = Resource> {
    ("sagemaker-[a-z]{3,8}", 0u64..(50 * 1024 * 1024 * 1024), 0u64..1000)
        .prop_map(|(name, size, count)| Resource::bucket(name, size, count))
}

fn inventory_of(resources: Vec<Resource>) -> KindInventory {
    KindInventory {
        resources,
        ..KindInventory::default()
    }
}

proptest! {
    #[test]
    fn totals_follow_from_estimates(
        endpoints in prop::collection::vec(compute_resource(ResourceKind::Endpoint), 0..5),
        jobs in prop::collection::vec(compute_resource(ResourceKind::TrainingJob), 0..5),
        notebooks in prop::collection::vec(compute_resource(ResourceKind::NotebookInstance), 0..5),
        buckets in prop::collection::vec(bucket(), 0..5),
    ) {
        let inventory = Inventory {
            endpoints: inventory_of(endpoints),
            training_jobs: inventory_of(jobs),
            notebook_instances: inventory_of(notebooks),
            buckets: inventory_of(buckets),
            api_gateways: None,
        };
        let report = build_report("us-east-1", None, inventory, &PriceTable::builtin(), Utc::now());
        let totals = report.totals;

        let compute_hourly: f64 = [&report.endpoints, &report.training_jobs, &report.notebook_instances]
            .iter()
            .flat_map(|s| s.resources.iter())
            .map(|r| r.cost.hourly)
            .sum();
        prop_assert!((totals.hourly - compute_hourly).abs() < 1e-9);
        prop_assert!((totals.daily - totals.hourly * HOURS_PER_DAY).abs() < 1e-9);
        prop_assert!((totals.monthly_compute - totals.hourly * HOURS_PER_MONTH).abs() < 1e-6);
        prop_assert!(
            (totals.monthly - (totals.monthly_compute + totals.monthly_storage)).abs() < 1e-6
        );

        for priced in report.buckets.resources.iter() {
            prop_assert_eq!(priced.cost.hourly, 0.0);
        }
        for section in report.sections() {
            for priced in section.resources.iter().filter(|r| !r.resource.is_billing()) {
                prop_assert_eq!(priced.cost.hourly, 0.0);
                prop_assert_eq!(priced.cost.monthly, 0.0);
            }
        }
        prop_assert!(totals.hourly >= 0.0);
    }
}
