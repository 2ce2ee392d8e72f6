//! Audit command - classify snapshots and report verdicts

use crate::audit::{run_audit, AuditReport};
use crate::config::{ProjectConfig, UserConfig};
use crate::models::{AuditDomain, RiskLevel, Verdict};
use crate::reporters::{self, OutputFormat};
use crate::source::{parse_timestamp, SnapshotSource};
use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Domain: access-policies, external-sharing, label-coverage, oversharing, or all
    pub domain: String,

    /// Snapshot file or directory of *.json snapshots (repeatable)
    #[arg(long, short = 'i', required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output format: text, json, markdown (or md), csv
    #[arg(long, short = 'f', value_parser = ["text", "json", "markdown", "md", "csv"])]
    pub format: Option<String>,

    /// Output file, or a directory to write readiness-report.<ext> into (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Minimum risk listed in findings (display filter, does not affect verdicts)
    #[arg(long, value_parser = ["critical", "high", "medium", "low"])]
    pub min_risk: Option<String>,

    /// Maximum findings listed per domain
    #[arg(long)]
    pub top: Option<usize>,

    /// Exit code 1 when the overall verdict is below this (ready, nearly-ready, requires-work)
    #[arg(long, value_parser = ["ready", "nearly-ready", "requires-work", "not-ready"])]
    pub fail_below: Option<String>,

    /// Reference time for activity ages when a snapshot has no collected_at
    #[arg(long)]
    pub as_of: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Domains selected by the positional argument
fn select_domains(arg: &str, source: &SnapshotSource) -> Result<Vec<AuditDomain>> {
    if !arg.eq_ignore_ascii_case("all") {
        return Ok(vec![AuditDomain::from_str(arg)?]);
    }
    let found: Vec<AuditDomain> = source.domains().into_iter().collect();
    if found.is_empty() {
        anyhow::bail!(
            "No snapshot declares a \"domain\"; name the domain explicitly instead of 'all'"
        );
    }
    for domain in AuditDomain::ALL {
        if !found.contains(&domain) {
            info!("No snapshot for {}, skipping", domain);
        }
    }
    Ok(found)
}

/// Run the audit command
pub fn run(args: &AuditArgs, project: &ProjectConfig) -> Result<()> {
    let user = UserConfig::load()?;
    let defaults = &project.defaults;

    let format_name = args
        .format
        .clone()
        .or_else(|| defaults.format.clone())
        .or_else(|| user.format().map(str::to_string))
        .unwrap_or_else(|| "text".to_string());
    let format = OutputFormat::from_str(&format_name)?;

    let min_risk = match args.min_risk.as_deref().or(defaults.min_risk.as_deref()) {
        Some(s) => RiskLevel::from_str(s)?,
        None => RiskLevel::Low,
    };
    let fail_below = args
        .fail_below
        .as_deref()
        .or(defaults.fail_below.as_deref())
        .map(Verdict::from_str)
        .transpose()?;
    let top = args.top.or(defaults.top);

    let all = args.domain.eq_ignore_ascii_case("all");
    let mut source = SnapshotSource::load(&args.input)
        .context("Failed to load snapshots")?
        .require_domain(all);
    if let Some(raw) = &args.as_of {
        let as_of = parse_timestamp(raw)
            .with_context(|| format!("Invalid --as-of '{}': expected RFC 3339 or YYYY-MM-DD", raw))?;
        source = source.with_as_of(as_of);
    }

    let domains = select_domains(&args.domain, &source)?;
    let profiles = domains
        .iter()
        .map(|d| project.profile(*d))
        .collect::<Result<Vec<_>>>()?;

    let mut report = AuditReport::new(user.tenant().map(str::to_string), run_audit(&source, &profiles));
    for domain in &report.domains {
        if !domain.coverage.gaps.is_empty() {
            warn!(
                "{}: {} object(s) could not be scanned, results are partial",
                domain.domain,
                domain.coverage.gaps.len()
            );
        }
    }
    report.limit_findings(min_risk, top);

    let color = !args.no_color && args.output.is_none() && console::colors_enabled();
    let rendered = reporters::report_with_format(&report, format, color)?;

    match &args.output {
        Some(output) => {
            let path = if output.is_dir() {
                output.join(format!("readiness-report.{}", reporters::file_extension(format)))
            } else {
                output.clone()
            };
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Report written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => print!("{}", rendered),
    }

    check_fail_threshold(fail_below, report.overall);
    Ok(())
}

/// Exit with code 1 when the overall verdict is below the threshold
fn check_fail_threshold(fail_below: Option<Verdict>, overall: Verdict) {
    if let Some(threshold) = fail_below {
        if overall < threshold {
            eprintln!(
                "Failing: overall verdict '{}' is below --fail-below '{}'",
                overall, threshold
            );
            std::process::exit(1);
        }
    }
}
