//! Error types for smcost
//!
//! There are two error types: `SmcostError` (main error enum) and `ConfigError`
//! (configuration-file specific).
//!
//! ## Error Handling Philosophy
//!
//! Library code uses `crate::error::Result<T>` which returns `SmcostError`.
//! The binary uses `anyhow::Result<T>` for top-level error handling and maps the
//! typed error back to an exit code with `exit_codes::exit_code_for_error`.
//!
//! Only configuration problems (config file, credentials, region) are fatal.
//! Failures while listing one resource kind are not errors at this level: they
//! are recorded as `ApiFailure` values on that kind's report section so the
//! other kinds are still enumerated. Cleanup failures are recorded the same way,
//! per resource.
//!
//! ## When to Use Which Error
//!
//! - `ConfigError`: config file parsing and invalid values
//!   - Automatically converted to `SmcostError::Config` via `#[from]`
//!
//! - `MissingCredentials` / `MissingRegion` / `InvalidRegion`: the run cannot
//!   start. Build them through `error_helpers` so the message carries a fix.
//!
//! - `Aws`: the credentials check failed for another reason (network,
//!   throttling). Credentials may be fine, so no credential fixes are shown.

use thiserror::Error;

/// Main error type for smcost
#[derive(Error, Debug)]
pub enum SmcostError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("AWS credentials error: {message}")]
    MissingCredentials { message: String },

    #[error("No AWS region configured: {message}")]
    MissingRegion { message: String },

    #[error("Invalid AWS region '{region}': {reason}")]
    InvalidRegion { region: String, reason: String },

    /// STS could not be reached or answered with something other than a
    /// credentials problem
    #[error("AWS request failed: {message}")]
    Aws { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Failed to read config {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Failed to parse config: {0}")]
    ParseError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, SmcostError>;
