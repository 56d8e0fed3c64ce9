//! smcost library
//!
//! Scans an AWS account for SageMaker endpoints, training jobs, notebook
//! instances, ML storage buckets and API Gateways, estimates what they cost
//! and optionally shuts the billing compute down.

pub mod aws_utils;
pub mod config;
pub mod error;
pub mod error_helpers;
pub mod exit_codes;
pub mod provider;
pub mod providers;
pub mod resources;
pub mod utils;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SmcostError};
pub use resources::types::{ResourceKind, ScanReport};
