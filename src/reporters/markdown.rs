//! Markdown reporter for GitHub-flavored Markdown output
//!
//! Generates reports suitable for:
//! - Engagement write-ups
//! - Pull request or ticket comments
//! - Wiki pages

use crate::audit::{AuditReport, DomainReport};
use crate::models::{Finding, RiskLevel, Verdict};
use anyhow::Result;

/// Maximum findings to show per risk level
const MAX_FINDINGS_PER_LEVEL: usize = 10;

/// Render report as GitHub-flavored Markdown
pub fn render(report: &AuditReport) -> Result<String> {
    let mut md = String::new();

    md.push_str(&render_header(report));
    md.push('\n');

    md.push_str(&render_overview(report));
    md.push('\n');

    for domain in &report.domains {
        md.push_str(&render_domain(domain));
        md.push('\n');
    }

    md.push_str("---\n\n*Generated by readiness-audit*\n");

    Ok(md)
}

fn verdict_emoji(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Ready => "✅",
        Verdict::NearlyReady => "🟢",
        Verdict::RequiresWork => "⚠️",
        Verdict::NotReady => "❌",
    }
}

fn render_header(report: &AuditReport) -> String {
    let tenant = report
        .tenant
        .as_deref()
        .map(|t| format!(" | **Tenant: {}**", escape(t)))
        .unwrap_or_default();
    format!(
        "# {} AI Assistant Readiness Report\n\n**Overall: {}**{}\n\nGenerated: {}\n",
        verdict_emoji(report.overall),
        report.overall,
        tenant,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

fn render_overview(report: &AuditReport) -> String {
    let mut md = String::from("## Overview\n\n");
    md.push_str("| Domain | Verdict | Records | Avg Score | Critical | High | Coverage |\n");
    md.push_str("|--------|---------|---------|-----------|----------|------|----------|\n");
    for d in &report.domains {
        let s = &d.summary;
        let avg = s
            .average_score
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "-".to_string());
        md.push_str(&format!(
            "| {} | {} {} | {} | {} | {} | {} | {:.2}% |\n",
            d.title,
            verdict_emoji(s.verdict),
            s.verdict,
            s.evaluated,
            avg,
            s.counts.critical,
            s.counts.high,
            d.coverage.coverage_percent
        ));
    }
    md
}

fn render_domain(domain: &DomainReport) -> String {
    let mut md = format!("## {}\n\n", domain.title);
    md.push_str(&format!(
        "**Verdict: {} {}**\n\n",
        verdict_emoji(domain.summary.verdict),
        domain.summary.verdict
    ));

    if !domain.coverage.gaps.is_empty() {
        md.push_str("### Coverage Gaps\n\n");
        for gap in &domain.coverage.gaps {
            md.push_str(&format!("- `{}`: {}\n", gap.object, escape(&gap.reason)));
        }
        md.push('\n');
    }

    if domain.findings.is_empty() {
        md.push_str("No findings.\n");
        return md;
    }

    for level in RiskLevel::ALL.iter().rev() {
        let findings: Vec<&Finding> =
            domain.findings.iter().filter(|f| f.risk == *level).collect();
        if findings.is_empty() {
            continue;
        }
        md.push_str(&format!("### {} ({})\n\n", capitalize(level.as_str()), findings.len()));
        md.push_str("| Subject | Site | Score | Reasons |\n");
        md.push_str("|---------|------|-------|---------|\n");
        for f in findings.iter().take(MAX_FINDINGS_PER_LEVEL) {
            md.push_str(&format!(
                "| {} | {} | {} | {} |\n",
                escape(f.label()),
                f.site.as_deref().map(escape).unwrap_or_else(|| "-".to_string()),
                f.score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                escape(&f.reasons.join("; "))
            ));
        }
        if findings.len() > MAX_FINDINGS_PER_LEVEL {
            md.push_str(&format!(
                "\n*...and {} more*\n",
                findings.len() - MAX_FINDINGS_PER_LEVEL
            ));
        }
        md.push('\n');
    }

    md
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Escape characters that break table cells
fn escape(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}
