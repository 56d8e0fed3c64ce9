//! Common AWS utilities shared by the scanner and the provider
//!
//! Region resolution, SDK configuration loading and the mapping from SDK
//! errors to classified `ApiFailure`s live here so every service client
//! behaves the same way.

use crate::error::Result;
use crate::error_helpers::{missing_credentials, missing_region};
use crate::provider::{classify_error, ApiFailure};
use crate::validation::validate_region;
use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sagemaker::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::fmt;
use tracing::debug;

/// Checked before the SDK chain, which only looks at `AWS_REGION`
pub const DEFAULT_REGION_ENV: &str = "AWS_DEFAULT_REGION";

/// Where the region of a run came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    Flag,
    Environment,
    SdkChain,
    ConfigFile,
}

impl fmt::Display for RegionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RegionSource::Flag => "--region",
            RegionSource::Environment => DEFAULT_REGION_ENV,
            RegionSource::SdkChain => "AWS profile/environment",
            RegionSource::ConfigFile => "config file",
        };
        f.write_str(s)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First region candidate in precedence order
pub fn pick_region(
    flag: Option<String>,
    environment: Option<String>,
    sdk_chain: Option<String>,
    config_file: Option<String>,
) -> Option<(String, RegionSource)> {
    // An explicit flag is kept verbatim so validation can reject padding
    if let Some(region) = flag {
        return Some((region, RegionSource::Flag));
    }
    non_empty(environment)
        .map(|r| (r, RegionSource::Environment))
        .or_else(|| non_empty(sdk_chain).map(|r| (r, RegionSource::SdkChain)))
        .or_else(|| non_empty(config_file).map(|r| (r, RegionSource::ConfigFile)))
}

/// Resolve and validate the region to scan
pub async fn resolve_region(flag: Option<&str>, config_file: Option<&str>) -> Result<String> {
    let environment = std::env::var(DEFAULT_REGION_ENV).ok();
    let sdk_chain = if flag.is_none() && non_empty(environment.clone()).is_none() {
        RegionProviderChain::default_provider()
            .region()
            .await
            .map(|r| r.as_ref().to_string())
    } else {
        None
    };

    let (region, source) = pick_region(
        flag.map(str::to_string),
        environment,
        sdk_chain,
        config_file.map(str::to_string),
    )
    .ok_or_else(|| {
        missing_region("Could not determine an AWS region from --region, the environment, the AWS profile or the config file")
    })?;

    validate_region(&region)?;
    debug!("Using region {} (from {})", region, source);
    Ok(region)
}

/// Load the shared SDK configuration for one region
///
/// Fails early when no credentials provider could be built at all; whether
/// the credentials actually work is checked with STS by the scanner.
pub async fn load_sdk_config(region: &str) -> Result<SdkConfig> {
    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;

    if sdk_config.credentials_provider().is_none() {
        return Err(missing_credentials(
            "No AWS credentials provider could be configured",
        ));
    }
    Ok(sdk_config)
}

/// Classify a failed SDK call
///
/// Generic over the operation error so every service client can use it.
pub fn api_failure<E, R>(operation: &str, err: SdkError<E, R>) -> ApiFailure
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: fmt::Debug + 'static,
{
    let code = err.code().map(str::to_string);
    let message = match err.message() {
        Some(message) => message.to_string(),
        None => DisplayErrorContext(&err).to_string(),
    };
    let category = classify_error(code.as_deref(), &message);
    debug!(
        "{} failed: code={:?} category={}",
        operation, code, category
    );
    ApiFailure::new(operation, category, message)
}

/// Uniform access to SDK members
///
/// Members a service model marks as required come back bare (`&str`,
/// `&DateTime`), optional ones as `Option<&T>`.
pub trait Present<'a, T: ?Sized> {
    fn present(self) -> Option<&'a T>;
}

impl<'a, T: ?Sized> Present<'a, T> for &'a T {
    fn present(self) -> Option<&'a T> {
        Some(self)
    }
}

impl<'a, T: ?Sized> Present<'a, T> for Option<&'a T> {
    fn present(self) -> Option<&'a T> {
        self
    }
}

/// `Present` for scalar members
pub trait PresentValue<T> {
    fn present_value(self) -> Option<T>;
}

impl PresentValue<i32> for i32 {
    fn present_value(self) -> Option<i32> {
        Some(self)
    }
}

impl PresentValue<i32> for Option<i32> {
    fn present_value(self) -> Option<i32> {
        self
    }
}

impl PresentValue<bool> for bool {
    fn present_value(self) -> Option<bool> {
        Some(self)
    }
}

impl PresentValue<bool> for Option<bool> {
    fn present_value(self) -> Option<bool> {
        self
    }
}

/// Owned text of a string or enum member, `None` when absent or empty
pub fn text<'a, T, P>(member: P) -> Option<String>
where
    T: AsRef<str> + ?Sized + 'a,
    P: Present<'a, T>,
{
    member
        .present()
        .map(|v| v.as_ref().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_accepts_both_member_shapes() {
        let required: &str = "ep";
        let optional: Option<&str> = Some("ep");
        let missing: Option<&str> = None;
        assert_eq!(text(required), Some("ep".to_string()));
        assert_eq!(text(optional), Some("ep".to_string()));
        assert_eq!(text(missing), None);
        assert_eq!(text(""), None);
        assert_eq!(3_i32.present_value(), Some(3));
        assert_eq!(None::<bool>.present_value(), None);
    }

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_flag_wins() {
        assert_eq!(
            pick_region(s("eu-west-1"), s("us-east-1"), s("us-west-2"), s("ap-south-1")),
            Some(("eu-west-1".to_string(), RegionSource::Flag))
        );
    }

    #[test]
    fn test_environment_before_sdk_chain_and_config() {
        assert_eq!(
            pick_region(None, s("us-east-1"), s("us-west-2"), s("ap-south-1")),
            Some(("us-east-1".to_string(), RegionSource::Environment))
        );
        assert_eq!(
            pick_region(None, s("  "), s("us-west-2"), s("ap-south-1")),
            Some(("us-west-2".to_string(), RegionSource::SdkChain))
        );
    }

    #[test]
    fn test_config_file_is_last_resort() {
        assert_eq!(
            pick_region(None, None, None, s("ap-south-1")),
            Some(("ap-south-1".to_string(), RegionSource::ConfigFile))
        );
        assert_eq!(pick_region(None, None, None, None), None);
    }

    #[test]
    fn test_flag_is_not_trimmed() {
        let (region, _) = pick_region(s(" us-east-1"), None, None, None).unwrap();
        assert!(validate_region(&region).is_err());
    }

    #[tokio::test]
    async fn test_invalid_flag_is_a_region_error() {
        let err = resolve_region(Some("bogus"), None).await.unwrap_err();
        assert_eq!(
            crate::exit_codes::exit_code_for_error(&err),
            crate::exit_codes::codes::REGION_ERROR
        );
    }
}
