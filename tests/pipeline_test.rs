//! End-to-end audit pipeline tests through the public library API

use chrono::{TimeZone, Utc};
use readiness_audit::audit::{run_audit, run_domain, AuditReport, DomainProfile};
use readiness_audit::config::ProjectConfig;
use readiness_audit::models::{AuditDomain, AuditableRecord, RiskLevel, Verdict};
use readiness_audit::reporters::{report_with_format, OutputFormat};
use readiness_audit::source::{
    Coverage, CoverageGap, SnapshotSource, SourceBatch, SourcedRecord, TenantSource,
};

/// In-memory tenant with one fixed batch per domain
struct FixedTenant {
    batches: Vec<SourceBatch>,
}

impl TenantSource for FixedTenant {
    fn describe(&self) -> String {
        "fixed tenant".to_string()
    }

    fn fetch(&self, domain: AuditDomain) -> SourceBatch {
        self.batches
            .iter()
            .find(|b| b.domain == domain)
            .cloned()
            .unwrap_or_else(|| SourceBatch::new(domain, Vec::new(), Coverage::default()))
    }
}

fn shares(levels: &[(&str, &str)]) -> Vec<AuditableRecord> {
    levels
        .iter()
        .map(|(id, principal)| {
            AuditableRecord::new(*id).with_attr("sharedWithPrincipal", *principal)
        })
        .collect()
}

fn labeled_docs(labeled: usize, total: usize) -> Vec<AuditableRecord> {
    (0..total)
        .map(|i| AuditableRecord::new(format!("doc-{i}")).with_attr("hasLabel", i < labeled))
        .collect()
}

#[test]
fn test_access_policy_without_mfa_scores_80() {
    let profile = DomainProfile::builtin(AuditDomain::AccessPolicies).unwrap();
    let record = AuditableRecord::new("ca-all-users")
        .with_attr("appliesToAllUsers", true)
        .with_attr("requiresMFA", false)
        .with_attr("state", "enabled");
    let report = run_domain(
        &profile,
        SourceBatch::from_records(AuditDomain::AccessPolicies, vec![record]),
    );

    let finding = &report.findings[0];
    assert_eq!(finding.score, Some(80));
    assert!(finding
        .reasons
        .contains(&"No MFA requirement for AI tools".to_string()));
    assert_eq!(report.summary.average_score, Some(80.0));
    // Nothing enforces MFA, so the best verdict is out of reach
    assert_eq!(report.summary.verdict, Verdict::NearlyReady);
}

#[test]
fn test_everyone_share_is_critical_whatever_else_it_has() {
    let profile = DomainProfile::builtin(AuditDomain::Oversharing).unwrap();
    let record = AuditableRecord::new("doc-1")
        .with_attr("sharedWithPrincipal", "Everyone")
        .with_attr("principalType", "securityGroup")
        .with_attr("memberCount", 3)
        .with_attr("hasLabel", true);
    let report = run_domain(
        &profile,
        SourceBatch::from_records(AuditDomain::Oversharing, vec![record]),
    );

    assert_eq!(report.findings[0].risk, RiskLevel::Critical);
    assert_eq!(report.findings[0].reasons[0], "Shared with Everyone group");
    assert_eq!(report.summary.counts.critical, 1);
}

#[test]
fn test_label_coverage_boundary() {
    let profile = DomainProfile::builtin(AuditDomain::LabelCoverage).unwrap();

    let at_80 = run_domain(
        &profile,
        SourceBatch::from_records(AuditDomain::LabelCoverage, labeled_docs(80, 100)),
    );
    assert_eq!(at_80.summary.average_score, Some(80.0));
    assert_eq!(at_80.summary.verdict, Verdict::Ready);

    let at_79 = run_domain(
        &profile,
        SourceBatch::from_records(AuditDomain::LabelCoverage, labeled_docs(79, 100)),
    );
    assert_eq!(at_79.summary.verdict, Verdict::NearlyReady);

    // 79.996% shows as 80.00 but stays below the band
    let just_under = run_domain(
        &profile,
        SourceBatch::from_records(AuditDomain::LabelCoverage, labeled_docs(19_999, 25_000)),
    );
    assert_eq!(just_under.summary.average_score, Some(80.0));
    assert_eq!(just_under.summary.verdict, Verdict::NearlyReady);
}

#[test]
fn test_single_critical_is_not_diluted() {
    let profile = DomainProfile::builtin(AuditDomain::Oversharing).unwrap();
    let mut records = shares(&[("doc-0", "Everyone")]);
    for i in 1..10 {
        records.push(AuditableRecord::new(format!("doc-{i}")).with_attr("principalType", "user"));
    }
    let report = run_domain(
        &profile,
        SourceBatch::from_records(AuditDomain::Oversharing, records),
    );

    assert_eq!(report.summary.counts.low, 9);
    assert_eq!(report.summary.counts.critical, 1);
    assert!(report.summary.verdict < Verdict::NearlyReady);
    assert_eq!(report.findings[0].subject_id, "doc-0");
}

#[test]
fn test_empty_domain_is_never_ready() {
    let profile = DomainProfile::builtin(AuditDomain::ExternalSharing).unwrap();
    let report = run_domain(
        &profile,
        SourceBatch::new(AuditDomain::ExternalSharing, Vec::new(), Coverage::default()),
    );
    assert_eq!(report.summary.evaluated, 0);
    assert_eq!(report.summary.verdict, Verdict::NotReady);
}

#[test]
fn test_run_audit_overall_is_worst_domain() {
    let tenant = FixedTenant {
        batches: vec![
            SourceBatch::from_records(AuditDomain::LabelCoverage, labeled_docs(9, 10)),
            SourceBatch::new(
                AuditDomain::ExternalSharing,
                vec![SourcedRecord {
                    site: Some("finance".to_string()),
                    record: AuditableRecord::new("share-1")
                        .with_attr("isExternal", true)
                        .with_attr("permissionRole", "Edit"),
                }],
                Coverage::new(
                    1,
                    vec![CoverageGap {
                        object: "legal".to_string(),
                        reason: "403 Forbidden".to_string(),
                    }],
                ),
            ),
        ],
    };
    let profiles = vec![
        DomainProfile::builtin(AuditDomain::LabelCoverage).unwrap(),
        DomainProfile::builtin(AuditDomain::ExternalSharing).unwrap(),
    ];
    let time = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();
    let report = AuditReport::at(Some("contoso".to_string()), run_audit(&tenant, &profiles), time);

    let labels = report.domain(AuditDomain::LabelCoverage).unwrap();
    assert_eq!(labels.summary.verdict, Verdict::Ready);

    let sharing = report.domain(AuditDomain::ExternalSharing).unwrap();
    assert_eq!(sharing.findings[0].risk, RiskLevel::High);
    assert_eq!(sharing.findings[0].site.as_deref(), Some("finance"));
    assert_eq!(sharing.coverage.objects_failed, 1);
    assert_eq!(sharing.summary.verdict, Verdict::NearlyReady);

    assert_eq!(report.overall, Verdict::NearlyReady);
    assert_eq!(report.total_findings(), 11);

    let markdown = report_with_format(&report, OutputFormat::Markdown, false).unwrap();
    assert!(markdown.contains("legal"));
    assert!(markdown.contains("403 Forbidden"));
}

#[test]
fn test_snapshot_directory_to_report() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("users.json"),
        r#"{
          "domain": "external-sharing",
          "records": [
            { "subjectId": "guest-1", "displayName": "Old guest",
              "attributes": { "email": "someone@contractor.example", "lastActivity": "2026-06-01" } },
            { "subjectId": "guest-2",
              "attributes": { "email": "someone@contractor.example", "lastActivity": "2026-09-15" } }
          ]
        }"#,
    )
    .unwrap();

    let as_of = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
    let source = SnapshotSource::load(&[dir.path().to_path_buf()])
        .unwrap()
        .with_as_of(as_of);
    let profile = DomainProfile::builtin(AuditDomain::ExternalSharing).unwrap();
    let reports = run_audit(&source, &[profile]);

    let sharing = &reports[0];
    assert_eq!(sharing.summary.evaluated, 2);
    assert_eq!(sharing.summary.counts.medium, 1);
    assert_eq!(sharing.findings[0].label(), "Old guest");
    assert_eq!(sharing.findings[0].matched_rules, vec!["dormant-account".to_string()]);
    assert_eq!(sharing.summary.verdict, Verdict::Ready);
}

#[test]
fn test_project_overrides_change_verdict() {
    let config: ProjectConfig = toml::from_str(
        r#"
[domains.oversharing]
min_records = 5

[domains.oversharing.rules.everyone-except-external]
escalate = "critical"
"#,
    )
    .unwrap();
    let profile = config.profile(AuditDomain::Oversharing).unwrap();
    let records = shares(&[
        ("doc-1", "Everyone except external users"),
        ("doc-2", "Finance team"),
    ]);
    let report = run_domain(
        &profile,
        SourceBatch::from_records(AuditDomain::Oversharing, records),
    );

    assert_eq!(report.findings[0].risk, RiskLevel::Critical);
    // Below min_records
    assert_eq!(report.summary.verdict, Verdict::NotReady);
}
