//! Helper functions for creating actionable error messages
//!
//! The fatal setup errors (credentials, region) are the ones users hit on a
//! fresh machine, so they carry the concrete steps to fix them.

use crate::error::SmcostError;

const CREDENTIAL_FIXES: &[&str] = &[
    "Configure the AWS CLI: aws configure",
    "Or export AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY (and AWS_DEFAULT_REGION)",
    "Or select a profile with AWS_PROFILE",
    "Or attach an IAM role when running on EC2 / SageMaker",
];

const REGION_FIXES: &[&str] = &[
    "Pass the region explicitly: smcost --region us-east-1",
    "Or export AWS_DEFAULT_REGION / AWS_REGION",
    "Or set `region` in .smcost.toml",
];

fn with_steps(mut message: String, heading: &str, steps: &[&str]) -> String {
    if !steps.is_empty() {
        message.push_str(&format!("\n\n{}:\n", heading));
        for (i, step) in steps.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, step));
        }
    }
    message
}

/// Credentials could not be resolved or were rejected by STS
pub fn missing_credentials(cause: impl Into<String>) -> SmcostError {
    SmcostError::MissingCredentials {
        message: with_steps(cause.into(), "To fix this", CREDENTIAL_FIXES),
    }
}

/// Region auto-detection found nothing
pub fn missing_region(cause: impl Into<String>) -> SmcostError {
    SmcostError::MissingRegion {
        message: with_steps(cause.into(), "To fix this", REGION_FIXES),
    }
}

/// Create a validation error with format examples
pub fn invalid_region_with_examples(
    region: impl Into<String>,
    reason: impl Into<String>,
    examples: &[&str],
) -> SmcostError {
    SmcostError::InvalidRegion {
        region: region.into(),
        reason: with_steps(reason.into(), "Valid examples", examples),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_lists_fixes() {
        let err = missing_credentials("ExpiredToken: token expired");
        let msg = err.to_string();
        assert!(msg.contains("ExpiredToken"));
        assert!(msg.contains("aws configure"));
        assert!(msg.contains("AWS_ACCESS_KEY_ID"));
    }

    #[test]
    fn test_missing_region_suggests_flag() {
        let msg = missing_region("no region found").to_string();
        assert!(msg.contains("--region"));
        assert!(msg.contains("AWS_DEFAULT_REGION"));
    }

    #[test]
    fn test_invalid_region_examples() {
        let err = invalid_region_with_examples("useast1", "bad format", &["us-east-1"]);
        let msg = err.to_string();
        assert!(msg.contains("useast1"));
        assert!(msg.contains("Valid examples"));
        assert!(msg.contains("1. us-east-1"));
    }
}
