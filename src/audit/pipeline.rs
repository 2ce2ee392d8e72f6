//! Per-domain audit runs and the combined report

use super::DomainProfile;
use crate::models::{deterministic_finding_id, AuditDomain, Category, Finding, RiskLevel, Verdict};
use crate::scoring::AggregateSummary;
use crate::source::{Coverage, SourceBatch, TenantSource};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{info, warn};

/// Result of auditing one domain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainReport {
    pub domain: AuditDomain,
    pub title: String,
    pub summary: AggregateSummary,
    /// Worst first
    pub findings: Vec<Finding>,
    pub coverage: Coverage,
}

impl DomainReport {
    /// Drop findings below `min_risk` and keep at most `top`
    ///
    /// Only the listing changes; the summary still covers every record.
    pub fn limit_findings(&mut self, min_risk: RiskLevel, top: Option<usize>) {
        self.findings.retain(|f| f.risk >= min_risk);
        if let Some(n) = top {
            self.findings.truncate(n);
        }
    }
}

fn finding_order(a: &Finding, b: &Finding) -> Ordering {
    b.risk
        .cmp(&a.risk)
        .then_with(|| a.score.cmp(&b.score))
        .then_with(|| a.site.cmp(&b.site))
        .then_with(|| a.subject_id.cmp(&b.subject_id))
}

/// Classify and aggregate one batch
pub fn run_domain(profile: &DomainProfile, batch: SourceBatch) -> DomainReport {
    if batch.domain != profile.domain {
        warn!(
            "Batch for {} audited with the {} profile",
            batch.domain, profile.domain
        );
    }

    let results = profile
        .engine
        .classify_all(batch.records.iter().map(|sourced| &sourced.record));

    let mut findings: Vec<Finding> = batch
        .records
        .iter()
        .zip(&results)
        .map(|(sourced, result)| Finding {
            id: deterministic_finding_id(
                profile.domain,
                sourced.site.as_deref(),
                &sourced.record.subject_id,
            ),
            domain: profile.domain,
            site: sourced.site.clone(),
            subject_id: sourced.record.subject_id.clone(),
            display_name: sourced.record.display_name.clone(),
            risk: result.category.risk(),
            score: result.category.score(),
            reasons: result.reasons.clone(),
            matched_rules: result.matched_rules.clone(),
        })
        .collect();

    let summary = profile.aggregator.aggregate(&results);
    findings.sort_by(finding_order);

    info!(
        "{}: {} records, verdict {} ({}% coverage)",
        profile.domain, summary.evaluated, summary.verdict, batch.coverage.coverage_percent
    );

    DomainReport {
        domain: profile.domain,
        title: profile.domain.title().to_string(),
        summary,
        findings,
        coverage: batch.coverage,
    }
}

/// Fetch and audit every profile from one source
pub fn run_audit(source: &dyn TenantSource, profiles: &[DomainProfile]) -> Vec<DomainReport> {
    info!("Auditing {} domain(s) from {}", profiles.len(), source.describe());
    profiles
        .iter()
        .map(|profile| run_domain(profile, source.fetch(profile.domain)))
        .collect()
}

/// Combined report across domains
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub overall: Verdict,
    pub domains: Vec<DomainReport>,
}

impl AuditReport {
    pub fn new(tenant: Option<String>, domains: Vec<DomainReport>) -> Self {
        Self::at(tenant, domains, Utc::now())
    }

    /// Report with a fixed generation time
    pub fn at(tenant: Option<String>, domains: Vec<DomainReport>, generated_at: DateTime<Utc>) -> Self {
        let overall = domains
            .iter()
            .map(|d| d.summary.verdict)
            .min()
            .unwrap_or(Verdict::NotReady);
        Self {
            tenant,
            generated_at,
            overall,
            domains,
        }
    }

    pub fn limit_findings(&mut self, min_risk: RiskLevel, top: Option<usize>) {
        for domain in &mut self.domains {
            domain.limit_findings(min_risk, top);
        }
    }

    pub fn domain(&self, domain: AuditDomain) -> Option<&DomainReport> {
        self.domains.iter().find(|d| d.domain == domain)
    }

    pub fn total_findings(&self) -> usize {
        self.domains.iter().map(|d| d.findings.len()).sum()
    }
}
