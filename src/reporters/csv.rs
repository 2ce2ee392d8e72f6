//! CSV reporter
//!
//! One row per finding across all domains, quoted per RFC 4180. Reasons and
//! matched rule ids are joined with `; `.

use crate::audit::AuditReport;
use anyhow::Result;

const HEADER: [&str; 10] = [
    "id",
    "domain",
    "site",
    "subject_id",
    "display_name",
    "risk",
    "score",
    "reasons",
    "matched_rules",
    "domain_verdict",
];

/// Render report as CSV
pub fn render(report: &AuditReport) -> Result<String> {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().map(|h| h.to_string()));

    for domain in &report.domains {
        for f in &domain.findings {
            push_row(
                &mut out,
                [
                    f.id.clone(),
                    f.domain.to_string(),
                    f.site.clone().unwrap_or_default(),
                    f.subject_id.clone(),
                    f.display_name.clone().unwrap_or_default(),
                    f.risk.to_string(),
                    f.score.map(|s| s.to_string()).unwrap_or_default(),
                    f.reasons.join("; "),
                    f.matched_rules.join("; "),
                    domain.summary.verdict.label().to_string(),
                ],
            );
        }
    }

    Ok(out)
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let row: Vec<String> = fields.into_iter().map(|f| quote(&f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// Quote a field when it contains a delimiter, quote or line break
fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
