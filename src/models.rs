//! Core data models for readiness audits
//!
//! These models are shared by the rule engine, the aggregator and the
//! reporters: raw records coming out of a tenant snapshot, the ordered
//! risk/verdict enums, and the flattened findings that end up in reports.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Generate a deterministic finding ID based on content hash.
///
/// The same (domain, site, subject) triple always yields the same 16-character
/// hex ID, so findings can be compared across audit runs.
pub fn deterministic_finding_id(domain: AuditDomain, site: Option<&str>, subject_id: &str) -> String {
    let input = format!("{}\n{}\n{}", domain.as_str(), site.unwrap_or(""), subject_id);
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(8).map(|b| format!("{:02x}", b)).collect()
}

/// The four audit dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditDomain {
    AccessPolicies,
    ExternalSharing,
    LabelCoverage,
    Oversharing,
}

impl AuditDomain {
    pub const ALL: [AuditDomain; 4] = [
        AuditDomain::AccessPolicies,
        AuditDomain::ExternalSharing,
        AuditDomain::LabelCoverage,
        AuditDomain::Oversharing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditDomain::AccessPolicies => "access-policies",
            AuditDomain::ExternalSharing => "external-sharing",
            AuditDomain::LabelCoverage => "label-coverage",
            AuditDomain::Oversharing => "oversharing",
        }
    }

    /// Heading used in reports
    pub fn title(&self) -> &'static str {
        match self {
            AuditDomain::AccessPolicies => "Conditional Access Compatibility",
            AuditDomain::ExternalSharing => "External Sharing Risk",
            AuditDomain::LabelCoverage => "Sensitivity Label Coverage",
            AuditDomain::Oversharing => "Oversharing Content Scan",
        }
    }
}

impl fmt::Display for AuditDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditDomain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "access-policies" | "conditional-access" | "ca" => Ok(AuditDomain::AccessPolicies),
            "external-sharing" | "sharing" => Ok(AuditDomain::ExternalSharing),
            "label-coverage" | "labels" => Ok(AuditDomain::LabelCoverage),
            "oversharing" => Ok(AuditDomain::Oversharing),
            _ => Err(anyhow::anyhow!(
                "Unknown audit domain '{}'. Valid domains: access-policies, external-sharing, label-coverage, oversharing",
                s
            )),
        }
    }
}

/// Risk levels for classified records, totally ordered
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// All levels, lowest first
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Integer rank (Low = 0, Critical = 3)
    pub fn rank(&self) -> u8 {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
            RiskLevel::Critical => 3,
        }
    }

    /// Raise to `other` if it is higher; never lowers.
    pub fn escalate(self, other: RiskLevel) -> RiskLevel {
        self.max(other)
    }

    /// Map a 0-100 score onto a risk band (>=80 Low, >=60 Medium, >=40 High)
    pub fn from_score(score: Score) -> RiskLevel {
        match score.value() {
            80..=100 => RiskLevel::Low,
            60..=79 => RiskLevel::Medium,
            40..=59 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(anyhow::anyhow!(
                "Unknown risk level '{}'. Valid levels: low, medium, high, critical",
                s
            )),
        }
    }
}

/// A compatibility score, always within 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(0);
    pub const MAX: Score = Score(100);

    /// Clamp a raw running total into range
    pub fn clamped(raw: i64) -> Score {
        Score(raw.clamp(0, 100) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top-line outcome of one audit dimension, worst first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    NotReady,
    RequiresWork,
    NearlyReady,
    Ready,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Ready => "Ready",
            Verdict::NearlyReady => "Nearly Ready",
            Verdict::RequiresWork => "Requires Work",
            Verdict::NotReady => "Not Ready",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Verdict {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace([' ', '_'], "-").as_str() {
            "ready" => Ok(Verdict::Ready),
            "nearly-ready" => Ok(Verdict::NearlyReady),
            "requires-work" => Ok(Verdict::RequiresWork),
            "not-ready" => Ok(Verdict::NotReady),
            _ => Err(anyhow::anyhow!(
                "Unknown verdict '{}'. Valid verdicts: ready, nearly-ready, requires-work, not-ready",
                s
            )),
        }
    }
}

/// A single attribute value on a record
///
/// Snapshots come from JSON exports, so the value shape follows JSON:
/// booleans, integers, floats, strings, string lists and null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
    Null,
}

impl AttributeValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view (integers widen to f64)
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(v) => Some(*v as f64),
            AttributeValue::Float(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(v) => Some(v.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttributeValue::List(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<i32> for AttributeValue {
    fn from(v: i32) -> Self {
        AttributeValue::Integer(v as i64)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(v: Vec<String>) -> Self {
        AttributeValue::List(v)
    }
}

/// One access-control or governance object as exported from the tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditableRecord {
    #[serde(alias = "subjectId")]
    pub subject_id: String,
    #[serde(default, alias = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl AuditableRecord {
    pub fn new(subject_id: impl Into<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            display_name: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }
}

/// Anything a classifier can produce as a category
pub trait Category: Copy + Ord + fmt::Debug {
    /// Risk band used for aggregate counts
    fn risk(&self) -> RiskLevel;

    /// Numeric score, for scoring-variant categories
    fn score(&self) -> Option<u8> {
        None
    }
}

impl Category for RiskLevel {
    fn risk(&self) -> RiskLevel {
        *self
    }
}

impl Category for Score {
    fn risk(&self) -> RiskLevel {
        RiskLevel::from_score(*self)
    }

    fn score(&self) -> Option<u8> {
        Some(self.value())
    }
}

/// Output of classifying one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult<C> {
    pub subject_id: String,
    pub category: C,
    /// Reasons in rule evaluation order, never deduplicated
    pub reasons: Vec<String>,
    /// IDs of the rules that matched, in evaluation order
    pub matched_rules: Vec<String>,
}

/// A classified record flattened for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub domain: AuditDomain,
    #[serde(default)]
    pub site: Option<String>,
    pub subject_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub risk: RiskLevel,
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub matched_rules: Vec<String>,
}

impl Finding {
    /// Name shown in reports: display name when present, subject ID otherwise
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.subject_id)
    }
}

/// Counts of records per risk level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl RiskCounts {
    pub fn from_levels(levels: impl IntoIterator<Item = RiskLevel>) -> Self {
        let mut counts = Self::default();
        for level in levels {
            counts.record(level);
        }
        counts
    }

    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Critical => self.critical += 1,
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
        }
        self.total += 1;
    }

    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Critical => self.critical,
            RiskLevel::High => self.high,
            RiskLevel::Medium => self.medium,
            RiskLevel::Low => self.low,
        }
    }

    /// Records above Low
    pub fn flagged(&self) -> usize {
        self.critical + self.high + self.medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert_eq!(RiskLevel::Critical.rank(), 3);
        assert_eq!(RiskLevel::High.escalate(RiskLevel::Medium), RiskLevel::High);
        assert_eq!(RiskLevel::Low.escalate(RiskLevel::Critical), RiskLevel::Critical);
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(RiskLevel::from_score(Score::clamped(100)), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(Score::clamped(80)), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(Score::clamped(79)), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(Score::clamped(40)), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(Score::clamped(39)), RiskLevel::Critical);
        assert_eq!(Score::clamped(-35), Score::MIN);
        assert_eq!(Score::clamped(250), Score::MAX);
    }

    #[test]
    fn test_verdict_ordering_and_parsing() {
        assert!(Verdict::NotReady < Verdict::RequiresWork);
        assert!(Verdict::NearlyReady < Verdict::Ready);
        assert_eq!("nearly-ready".parse::<Verdict>().unwrap(), Verdict::NearlyReady);
        assert_eq!("Requires Work".parse::<Verdict>().unwrap(), Verdict::RequiresWork);
        assert!("maybe".parse::<Verdict>().is_err());
        assert_eq!(Verdict::NotReady.to_string(), "Not Ready");
    }

    #[test]
    fn test_domain_parsing() {
        assert_eq!("labels".parse::<AuditDomain>().unwrap(), AuditDomain::LabelCoverage);
        assert_eq!(
            "external_sharing".parse::<AuditDomain>().unwrap(),
            AuditDomain::ExternalSharing
        );
        assert!("mailboxes".parse::<AuditDomain>().is_err());
    }

    #[test]
    fn test_attribute_values_from_json() {
        let record: AuditableRecord = serde_json::from_str(
            r#"{
                "subject_id": "p1",
                "attributes": {
                    "requiresMFA": false,
                    "memberCount": 1200,
                    "ratio": 0.5,
                    "state": "enabled",
                    "domains": ["gmail.com"],
                    "lastActivity": null
                }
            }"#,
        )
        .unwrap();
        assert_eq!(record.attr("requiresMFA"), Some(&AttributeValue::Bool(false)));
        assert_eq!(record.attr("memberCount").and_then(|v| v.as_f64()), Some(1200.0));
        assert_eq!(record.attr("ratio").and_then(|v| v.as_f64()), Some(0.5));
        assert_eq!(record.attr("state").and_then(|v| v.as_str()), Some("enabled"));
        assert_eq!(record.attr("domains").and_then(|v| v.as_list()).map(|l| l.len()), Some(1));
        assert_eq!(record.attr("lastActivity"), Some(&AttributeValue::Null));
        assert!(record.display_name.is_none());
    }

    #[test]
    fn test_finding_id_is_stable() {
        let a = deterministic_finding_id(AuditDomain::Oversharing, Some("hr"), "doc-1");
        let b = deterministic_finding_id(AuditDomain::Oversharing, Some("hr"), "doc-1");
        let c = deterministic_finding_id(AuditDomain::Oversharing, Some("legal"), "doc-1");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_risk_counts() {
        let counts = RiskCounts::from_levels([
            RiskLevel::Low,
            RiskLevel::Critical,
            RiskLevel::Medium,
            RiskLevel::Low,
        ]);
        assert_eq!(counts.total, 4);
        assert_eq!(counts.count(RiskLevel::Low), 2);
        assert_eq!(counts.count(RiskLevel::Critical), 1);
        assert_eq!(counts.flagged(), 2);
    }
}
