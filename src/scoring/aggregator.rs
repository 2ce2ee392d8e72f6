//! Aggregator implementation

use crate::models::{AuditDomain, Category, ClassificationResult, RiskCounts, RiskLevel, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Round to two decimal places (half away from zero)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A single predicate over an aggregate summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Threshold {
    /// At most `max` records at exactly `level`
    MaxCount { level: RiskLevel, max: usize },
    /// Average score at or above `value` (never holds without scores)
    MinAverageScore { value: f64 },
    /// Share of records above Low at or below `value` percent
    MaxFlaggedPercent { value: f64 },
    /// Rule `rule` matched at least `count` records
    MinRuleHits { rule: String, count: usize },
}

impl Threshold {
    pub fn holds(&self, summary: &AggregateSummary) -> bool {
        match self {
            Threshold::MaxCount { level, max } => summary.counts.count(*level) <= *max,
            Threshold::MinAverageScore { value } => summary.average_at_least(*value),
            Threshold::MaxFlaggedPercent { value } => summary.flagged_at_most(*value),
            Threshold::MinRuleHits { rule, count } => summary.hits(rule) >= *count,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Threshold::MaxCount { level, max } => format!("{level} <= {max}"),
            Threshold::MinAverageScore { value } => format!("average score >= {value}"),
            Threshold::MaxFlaggedPercent { value } => format!("flagged <= {value}%"),
            Threshold::MinRuleHits { rule, count } => format!("'{rule}' matched >= {count}"),
        }
    }
}

/// Verdict awarded when every threshold holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRule {
    pub verdict: Verdict,
    pub all: Vec<Threshold>,
}

impl VerdictRule {
    pub fn new(verdict: Verdict, all: Vec<Threshold>) -> Self {
        Self { verdict, all }
    }

    // An empty threshold list does not hold
    fn holds(&self, summary: &AggregateSummary) -> bool {
        !self.all.is_empty() && self.all.iter().all(|t| t.holds(summary))
    }
}

/// Ordered verdict rules plus the minimum record count for any verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictPolicy {
    #[serde(default = "default_min_records")]
    pub min_records: usize,
    pub rules: Vec<VerdictRule>,
}

fn default_min_records() -> usize {
    1
}

impl VerdictPolicy {
    /// Default policy for a domain
    pub fn for_domain(domain: AuditDomain) -> Self {
        match domain {
            AuditDomain::AccessPolicies => Self::access_policies(),
            AuditDomain::ExternalSharing | AuditDomain::Oversharing => Self::sharing(),
            AuditDomain::LabelCoverage => Self::label_coverage(),
        }
    }

    pub fn access_policies() -> Self {
        Self {
            min_records: default_min_records(),
            rules: vec![
                VerdictRule::new(
                    Verdict::Ready,
                    vec![
                        max_count(RiskLevel::Critical, 0),
                        Threshold::MinAverageScore { value: 80.0 },
                        Threshold::MinRuleHits {
                            rule: "mfa-enforced".to_string(),
                            count: 1,
                        },
                    ],
                ),
                VerdictRule::new(
                    Verdict::NearlyReady,
                    vec![
                        max_count(RiskLevel::Critical, 2),
                        Threshold::MinAverageScore { value: 60.0 },
                    ],
                ),
                VerdictRule::new(
                    Verdict::RequiresWork,
                    vec![Threshold::MinAverageScore { value: 40.0 }],
                ),
            ],
        }
    }

    pub fn sharing() -> Self {
        Self {
            min_records: default_min_records(),
            rules: vec![
                VerdictRule::new(
                    Verdict::Ready,
                    vec![max_count(RiskLevel::Critical, 0), max_count(RiskLevel::High, 0)],
                ),
                VerdictRule::new(
                    Verdict::NearlyReady,
                    vec![max_count(RiskLevel::Critical, 0), max_count(RiskLevel::High, 5)],
                ),
                VerdictRule::new(Verdict::RequiresWork, vec![max_count(RiskLevel::Critical, 2)]),
            ],
        }
    }

    pub fn label_coverage() -> Self {
        let band = |verdict, value| {
            VerdictRule::new(verdict, vec![Threshold::MinAverageScore { value }])
        };
        Self {
            min_records: default_min_records(),
            rules: vec![
                band(Verdict::Ready, 80.0),
                band(Verdict::NearlyReady, 60.0),
                band(Verdict::RequiresWork, 40.0),
            ],
        }
    }

    /// First matching rule wins; too few records or no match is Not Ready
    pub fn verdict(&self, summary: &AggregateSummary) -> Verdict {
        if summary.evaluated == 0 || summary.evaluated < self.min_records {
            return Verdict::NotReady;
        }
        self.rules
            .iter()
            .find(|rule| rule.holds(summary))
            .map(|rule| rule.verdict)
            .unwrap_or(Verdict::NotReady)
    }
}

fn max_count(level: RiskLevel, max: usize) -> Threshold {
    Threshold::MaxCount { level, max }
}

/// Reduction of a result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub evaluated: usize,
    pub counts: RiskCounts,
    /// Mean score across scored results, if any were scored
    pub average_score: Option<f64>,
    /// Percentage of records above Low
    pub flagged_percent: f64,
    /// Number of records each rule matched
    pub rule_hits: BTreeMap<String, usize>,
    pub verdict: Verdict,
    /// Unrounded score total; thresholds compare against this, not `average_score`
    #[serde(skip)]
    score_sum: u64,
    #[serde(skip)]
    scored: u64,
}

impl AggregateSummary {
    /// All-zero summary with the worst-case verdict
    pub fn empty() -> Self {
        Self {
            evaluated: 0,
            counts: RiskCounts::default(),
            average_score: None,
            flagged_percent: 0.0,
            rule_hits: BTreeMap::new(),
            verdict: Verdict::NotReady,
            score_sum: 0,
            scored: 0,
        }
    }

    /// Exact `average >= value`, so 79.996 never passes an 80 band
    fn average_at_least(&self, value: f64) -> bool {
        self.scored > 0 && self.score_sum as f64 >= value * self.scored as f64
    }

    /// Exact `flagged percent <= value`
    fn flagged_at_most(&self, value: f64) -> bool {
        self.counts.flagged() as f64 * 100.0 <= value * self.evaluated as f64
    }

    pub fn hits(&self, rule: &str) -> usize {
        self.rule_hits.get(rule).copied().unwrap_or(0)
    }
}

/// Reduces classification results under a verdict policy
#[derive(Debug, Clone)]
pub struct Aggregator {
    policy: VerdictPolicy,
}

impl Aggregator {
    pub fn new(policy: VerdictPolicy) -> Self {
        Self { policy }
    }

    pub fn for_domain(domain: AuditDomain) -> Self {
        Self::new(VerdictPolicy::for_domain(domain))
    }

    pub fn policy(&self) -> &VerdictPolicy {
        &self.policy
    }

    pub fn aggregate<C: Category>(&self, results: &[ClassificationResult<C>]) -> AggregateSummary {
        let mut summary = AggregateSummary::empty();

        for result in results {
            summary.counts.record(result.category.risk());
            if let Some(score) = result.category.score() {
                summary.score_sum += u64::from(score);
                summary.scored += 1;
            }
            for rule in &result.matched_rules {
                *summary.rule_hits.entry(rule.clone()).or_insert(0) += 1;
            }
        }

        summary.evaluated = results.len();
        // Integer sums keep the average independent of input order
        if summary.scored > 0 {
            summary.average_score =
                Some(round2(summary.score_sum as f64 / summary.scored as f64));
        }
        if summary.evaluated > 0 {
            summary.flagged_percent =
                round2(summary.counts.flagged() as f64 * 100.0 / summary.evaluated as f64);
        }
        summary.verdict = self.policy.verdict(&summary);

        debug!(
            "Aggregated {} results: {} critical, {} high, avg {:?} -> {}",
            summary.evaluated,
            summary.counts.critical,
            summary.counts.high,
            summary.average_score,
            summary.verdict
        );

        summary
    }
}

/// Aggregate under an explicit policy
pub fn aggregate<C: Category>(
    results: &[ClassificationResult<C>],
    policy: &VerdictPolicy,
) -> AggregateSummary {
    Aggregator::new(policy.clone()).aggregate(results)
}

/// Label coverage computed straight from counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCoverage {
    pub labeled: usize,
    pub total: usize,
    pub percent: f64,
    pub verdict: Verdict,
}

impl LabelCoverage {
    pub fn from_counts(labeled: usize, total: usize) -> Self {
        let labeled = labeled.min(total);
        let mut summary = AggregateSummary::empty();
        summary.evaluated = total;
        summary.counts = RiskCounts {
            critical: total - labeled,
            high: 0,
            medium: 0,
            low: labeled,
            total,
        };
        summary.score_sum = labeled as u64 * 100;
        summary.scored = total as u64;
        if total > 0 {
            let percent = round2(labeled as f64 * 100.0 / total as f64);
            summary.average_score = Some(percent);
            summary.flagged_percent = round2(100.0 - percent);
        }
        let verdict = VerdictPolicy::label_coverage().verdict(&summary);
        Self {
            labeled,
            total,
            percent: summary.average_score.unwrap_or(0.0),
            verdict,
        }
    }
}
