//! Exit code standardization for smcost
//!
//! Scripts wrapping the scanner (cron jobs, CI cost guards) rely on these
//! codes to tell a clean scan from a setup problem.
//!
//! ## Exit Code Convention
//!
//! - `0` = Success (including an empty account and skipped cleanups)
//! - `1` = User error (bad arguments, validation failure)
//! - `2` = System error (every resource kind failed to enumerate, AWS API failure)
//! - `3` = Configuration error (config file missing fields, parse error)
//! - `4` = Missing or invalid AWS credentials
//! - `5` = Missing or invalid AWS region

use crate::error::SmcostError;

/// Standard exit codes for smcost
pub mod codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// User error (invalid input, validation failure)
    pub const USER_ERROR: i32 = 1;
    /// System error (AWS API failure, network error)
    pub const SYSTEM_ERROR: i32 = 2;
    /// Configuration file error
    pub const CONFIG_ERROR: i32 = 3;
    /// Credentials could not be resolved or were rejected
    pub const CREDENTIALS_ERROR: i32 = 4;
    /// No usable region
    pub const REGION_ERROR: i32 = 5;
}

/// Map an SmcostError to an appropriate exit code
pub fn exit_code_for_error(error: &SmcostError) -> i32 {
    use SmcostError::*;
    match error {
        Config(_) => codes::CONFIG_ERROR,
        MissingCredentials { .. } => codes::CREDENTIALS_ERROR,
        MissingRegion { .. } | InvalidRegion { .. } => codes::REGION_ERROR,

        Aws { .. } => codes::SYSTEM_ERROR,
        Io(_) => codes::SYSTEM_ERROR,
        Json(_) => codes::SYSTEM_ERROR,
    }
}

/// Exit code for an error that reached `main` through `anyhow`
///
/// Errors that did not originate in this crate count as system errors.
pub fn exit_code_for_anyhow(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<SmcostError>()
        .map(exit_code_for_error)
        .unwrap_or(codes::SYSTEM_ERROR)
}
