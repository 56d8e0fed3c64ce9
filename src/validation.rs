//! Input validation utilities
//!
//! Provides validation functions for user inputs to prevent
//! invalid data from reaching the AWS SDK.

use crate::error::Result;
use crate::error_helpers::invalid_region_with_examples;
use regex::Regex;
use std::sync::OnceLock;

const REGION_EXAMPLES: &[&str] = &["us-east-1", "eu-west-1", "ap-southeast-2", "us-gov-west-1"];

fn region_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // partition prefix, optional gov/iso qualifier, direction, index
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-[0-9]{1,2}$")
            .expect("region pattern is valid")
    })
}

/// Validate AWS region code format
///
/// Region codes look like `us-east-1`, `eu-central-2` or `us-gov-west-1`.
/// Availability zone names (`us-east-1a`) are rejected.
pub fn validate_region(region: &str) -> Result<()> {
    if region.is_empty() {
        return Err(invalid_region_with_examples(
            region,
            "Region must not be empty",
            REGION_EXAMPLES,
        ));
    }

    if region != region.trim() || region.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid_region_with_examples(
            region,
            "Region codes are lowercase without surrounding whitespace",
            REGION_EXAMPLES,
        ));
    }

    if !region_pattern().is_match(region) {
        return Err(invalid_region_with_examples(
            region,
            "Not a valid AWS region code",
            REGION_EXAMPLES,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SmcostError;

    #[test]
    fn test_validate_region_valid() {
        for region in [
            "us-east-1",
            "us-west-2",
            "eu-central-1",
            "ap-southeast-2",
            "ap-northeast-1",
            "sa-east-1",
            "me-south-1",
            "us-gov-west-1",
            "cn-north-1",
            "us-isob-east-1",
        ] {
            assert!(validate_region(region).is_ok(), "{} should be valid", region);
        }
    }

    #[test]
    fn test_validate_region_invalid() {
        for region in ["", "useast1", "us-east", "us-east-1a", "US-EAST-1", " us-east-1", "global"] {
            let result = validate_region(region);
            assert!(
                matches!(result, Err(SmcostError::InvalidRegion { .. })),
                "{:?} should be rejected",
                region
            );
        }
    }
}
