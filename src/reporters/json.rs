//! JSON reporter
//!
//! Outputs the full AuditReport as pretty-printed JSON.

use crate::audit::AuditReport;
use anyhow::Result;

/// Render report as JSON
pub fn render(report: &AuditReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
