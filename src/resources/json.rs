//! JSON projection of a scan report
//!
//! The document is the serialized `ScanReport`, so every figure matches the
//! text report exactly.

use crate::error::Result;
use crate::resources::types::ScanReport;

/// Serialize the report as a JSON value
pub fn report_json(report: &ScanReport) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(report)?)
}

/// Pretty-printed JSON document for stdout
pub fn render_json(report: &ScanReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
