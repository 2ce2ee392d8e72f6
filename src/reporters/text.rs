//! Text (terminal) reporter with colors and formatting

use crate::audit::{AuditReport, DomainReport};
use crate::models::{RiskLevel, Verdict};
use anyhow::Result;

/// Findings listed per domain before the listing is cut short
const MAX_TEXT_FINDINGS: usize = 15;

/// Verdict colors (ANSI escape codes)
fn verdict_color(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Ready => "\x1b[32m",        // Green
        Verdict::NearlyReady => "\x1b[92m",  // Light green
        Verdict::RequiresWork => "\x1b[33m", // Yellow
        Verdict::NotReady => "\x1b[31m",     // Red
    }
}

/// Risk colors
fn risk_color(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Critical => "\x1b[31m", // Red
        RiskLevel::High => "\x1b[91m",     // Light red
        RiskLevel::Medium => "\x1b[33m",   // Yellow
        RiskLevel::Low => "\x1b[34m",      // Blue
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

fn risk_tag(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Critical => "[C]",
        RiskLevel::High => "[H]",
        RiskLevel::Medium => "[M]",
        RiskLevel::Low => "[L]",
    }
}

/// Render report as formatted terminal output
pub fn render(report: &AuditReport) -> Result<String> {
    let mut out = String::new();

    let vc = verdict_color(report.overall);
    out.push_str(&format!("\n{BOLD}AI Assistant Readiness Audit{RESET}\n"));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    if let Some(tenant) = &report.tenant {
        out.push_str(&format!("Tenant: {BOLD}{}{RESET}  ", tenant));
    }
    out.push_str(&format!(
        "Overall: {vc}{BOLD}{}{RESET}  {DIM}Generated {}{RESET}\n",
        report.overall,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    for domain in &report.domains {
        out.push('\n');
        render_domain(&mut out, domain);
    }

    out.push('\n');
    match report.overall {
        Verdict::Ready => out.push_str(&format!(
            "{DIM}All audited domains are ready for rollout.{RESET}\n"
        )),
        Verdict::NotReady => out.push_str(&format!(
            "{DIM}Resolve critical findings and coverage gaps before rollout.{RESET}\n"
        )),
        _ => out.push_str(&format!(
            "{DIM}Address the listed findings, then re-run the audit.{RESET}\n"
        )),
    }

    Ok(out)
}

fn render_domain(out: &mut String, domain: &DomainReport) {
    let s = &domain.summary;
    let vc = verdict_color(s.verdict);

    out.push_str(&format!(
        "{BOLD}{}{RESET}  {vc}{BOLD}{}{RESET}\n",
        domain.title.to_uppercase(),
        s.verdict
    ));
    out.push_str(&format!("  Records: {}", s.evaluated));
    if let Some(avg) = s.average_score {
        out.push_str(&format!("  Average score: {}", format_score(avg)));
    }
    out.push_str(&format!("  Flagged: {:.2}%\n", s.flagged_percent));

    let mut parts = Vec::new();
    for level in RiskLevel::ALL.iter().rev() {
        let n = s.counts.count(*level);
        if n > 0 {
            parts.push(format!("{}{} {}{RESET}", risk_color(*level), n, level));
        }
    }
    if !parts.is_empty() {
        out.push_str(&format!("  {}\n", parts.join(" | ")));
    }

    let cov = &domain.coverage;
    out.push_str(&format!(
        "  Coverage: {:.2}% ({} scanned, {} failed)\n",
        cov.coverage_percent, cov.objects_scanned, cov.objects_failed
    ));
    for gap in &cov.gaps {
        out.push_str(&format!("    {DIM}gap:{RESET} {} ({})\n", gap.object, gap.reason));
    }

    if domain.findings.is_empty() {
        return;
    }

    out.push_str(&format!(
        "{DIM}  #   RISK  SCORE  SUBJECT                         REASONS{RESET}\n"
    ));
    for (i, finding) in domain.findings.iter().take(MAX_TEXT_FINDINGS).enumerate() {
        let rc = risk_color(finding.risk);
        let score = finding
            .score
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let reasons = if finding.reasons.is_empty() {
            "-".to_string()
        } else {
            finding.reasons.join("; ")
        };
        out.push_str(&format!(
            "  {DIM}{:>3}{RESET}  {rc}{}{RESET}  {:>5}  {:<30}  {DIM}{}{RESET}\n",
            i + 1,
            risk_tag(finding.risk),
            score,
            truncate(&subject(finding), 30),
            reasons
        ));
    }

    let remaining = domain.findings.len().saturating_sub(MAX_TEXT_FINDINGS);
    if remaining > 0 {
        out.push_str(&format!(
            "\n  {DIM}...and {} more (use --format csv for the full list){RESET}\n",
            remaining
        ));
    }
}

fn subject(finding: &crate::models::Finding) -> String {
    match &finding.site {
        Some(site) => format!("{}/{}", site, finding.label()),
        None => finding.label().to_string(),
    }
}

// Char-based so multi-byte names can't split
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let head: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head)
}

fn format_score(score: f64) -> String {
    let color = if score >= 80.0 {
        "\x1b[32m"
    } else if score >= 60.0 {
        "\x1b[33m"
    } else {
        "\x1b[31m"
    };
    format!("{color}{:.2}{RESET}", score)
}
