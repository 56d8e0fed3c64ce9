//! Provider implementations

pub mod aws_provider;

pub use aws_provider::AwsProvider;
