//! Scoring and categorical classifiers

use super::Classifier;
use crate::models::{AuditableRecord, ClassificationResult, RiskLevel, Score};
use crate::rules::{Effect, RuleError, RuleSet, Variant};

/// Scoring variant: baseline plus deltas, clamped to 0..=100 at the end
#[derive(Debug, Clone)]
pub struct ScoringClassifier {
    baseline: i32,
    rules: RuleSet,
}

impl ScoringClassifier {
    pub fn new(rules: RuleSet) -> Result<Self, RuleError> {
        rules.validate()?;
        match rules.variant {
            Variant::Scoring { baseline } => Ok(Self { baseline, rules }),
            other => Err(RuleError::WrongVariant {
                expected: "scoring",
                found: other.name(),
            }),
        }
    }
}

impl Classifier for ScoringClassifier {
    type Category = Score;

    fn classify(&self, record: &AuditableRecord) -> ClassificationResult<Score> {
        let mut total = i64::from(self.baseline);
        let mut reasons = Vec::new();
        let mut matched_rules = Vec::new();

        for rule in &self.rules.rules {
            if !rule.when.matches(record) {
                continue;
            }
            if let Effect::Adjust(delta) = rule.effect {
                total += i64::from(delta);
            }
            if !rule.reason.is_empty() {
                reasons.push(rule.reason.clone());
            }
            matched_rules.push(rule.id.clone());
        }

        // Clamp once; intermediate totals may leave the range
        ClassificationResult {
            subject_id: record.subject_id.clone(),
            category: Score::clamped(total),
            reasons,
            matched_rules,
        }
    }

    fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

/// Categorical variant: starts at Low and only ever escalates
#[derive(Debug, Clone)]
pub struct CategoricalClassifier {
    rules: RuleSet,
}

impl CategoricalClassifier {
    pub fn new(rules: RuleSet) -> Result<Self, RuleError> {
        rules.validate()?;
        match rules.variant {
            Variant::Categorical => Ok(Self { rules }),
            other => Err(RuleError::WrongVariant {
                expected: "categorical",
                found: other.name(),
            }),
        }
    }
}

impl Classifier for CategoricalClassifier {
    type Category = RiskLevel;

    fn classify(&self, record: &AuditableRecord) -> ClassificationResult<RiskLevel> {
        let mut level = RiskLevel::Low;
        let mut reasons = Vec::new();
        let mut matched_rules = Vec::new();

        for rule in &self.rules.rules {
            if !rule.when.matches(record) {
                continue;
            }
            if let Effect::Escalate(ceiling) = rule.effect {
                level = level.escalate(ceiling);
            }
            if !rule.reason.is_empty() {
                reasons.push(rule.reason.clone());
            }
            matched_rules.push(rule.id.clone());
        }

        ClassificationResult {
            subject_id: record.subject_id.clone(),
            category: level,
            reasons,
            matched_rules,
        }
    }

    fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{builtin, Condition, Rule};

    fn access() -> ScoringClassifier {
        ScoringClassifier::new(builtin::access_policies()).unwrap()
    }

    fn sharing() -> CategoricalClassifier {
        CategoricalClassifier::new(builtin::external_sharing()).unwrap()
    }

    fn overshare() -> CategoricalClassifier {
        CategoricalClassifier::new(builtin::oversharing()).unwrap()
    }

    #[test]
    fn test_policy_without_mfa_scores_80() {
        let record = AuditableRecord::new("ca-1")
            .with_attr("appliesToAllUsers", true)
            .with_attr("requiresMFA", false)
            .with_attr("state", "enabled");
        let result = access().classify(&record);
        assert_eq!(result.category.value(), 80);
        assert!(result
            .reasons
            .contains(&"No MFA requirement for AI tools".to_string()));
        assert_eq!(result.matched_rules, vec!["no-mfa".to_string()]);
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let record = AuditableRecord::new("ca-2")
            .with_attr("requiresMFA", false)
            .with_attr("requiresCompliantDevice", false)
            .with_attr("blocksAllCloudApps", true)
            .with_attr("excludesAssistantApps", false)
            .with_attr("signInFrequencyHours", 1);
        let set = RuleSet::scoring(
            100,
            vec![
                Rule::adjust("a", -80, Condition::is_false("requiresMFA"), "a"),
                Rule::adjust("b", -80, Condition::is_false("requiresCompliantDevice"), "b"),
                Rule::adjust("c", 30, Condition::is_true("blocksAllCloudApps"), "c"),
            ],
        );
        let result = ScoringClassifier::new(set).unwrap().classify(&record);
        // -60 mid-way does not stop the +30 rule; final 100-80-80+30 = -30 -> 0
        assert_eq!(result.category, Score::MIN);
        assert_eq!(result.reasons, vec!["a", "b", "c"]);

        let builtin = access().classify(&record);
        assert_eq!(builtin.category.value(), 25);
        assert_eq!(builtin.reasons.len(), 4);
    }

    #[test]
    fn test_clamping_happens_once_at_the_end() {
        let record = AuditableRecord::new("x").with_attr("flag", true);
        let set = RuleSet::scoring(
            10,
            vec![
                Rule::adjust("down", -50, Condition::is_true("flag"), "down"),
                Rule::adjust("up", 60, Condition::is_true("flag"), "up"),
            ],
        );
        // Clamping per rule would give 0 + 60 = 60; clamping once gives 20
        let result = ScoringClassifier::new(set).unwrap().classify(&record);
        assert_eq!(result.category.value(), 20);
    }

    #[test]
    fn test_score_never_exceeds_100() {
        let record = AuditableRecord::new("x").with_attr("flag", true);
        let set = RuleSet::scoring(
            90,
            vec![Rule::adjust("up", 40, Condition::is_true("flag"), "up")],
        );
        let result = ScoringClassifier::new(set).unwrap().classify(&record);
        assert_eq!(result.category, Score::MAX);
    }

    #[test]
    fn test_everyone_share_is_critical_regardless() {
        let record = AuditableRecord::new("doc-1")
            .with_attr("sharedWithPrincipal", "Everyone")
            .with_attr("principalType", "securityGroup")
            .with_attr("memberCount", 5);
        let result = overshare().classify(&record);
        assert_eq!(result.category, RiskLevel::Critical);
        assert!(result
            .reasons
            .contains(&"Shared with Everyone group".to_string()));
    }

    #[test]
    fn test_category_only_escalates() {
        // Critical rule first, then a Medium one: must stay Critical
        let record = AuditableRecord::new("share-1")
            .with_attr("anonymousLink", true)
            .with_attr("groupMemberCount", 900);
        let result = sharing().classify(&record);
        assert_eq!(result.category, RiskLevel::Critical);
        assert_eq!(
            result.matched_rules,
            vec!["anonymous-link".to_string(), "large-group".to_string()]
        );
    }

    #[test]
    fn test_escalation_is_monotonic_over_prefixes() {
        let record = AuditableRecord::new("share-2")
            .with_attr("isExternal", true)
            .with_attr("permissionRole", "write")
            .with_attr("daysSinceActivity", 400)
            .with_attr("email", "guest@outlook.com")
            .with_attr("sharedWithEveryone", true);
        let full = sharing().rules().clone();
        let mut previous = RiskLevel::Low;
        for n in 0..=full.rules.len() {
            let prefix = RuleSet::categorical(full.rules[..n].to_vec());
            let level = CategoricalClassifier::new(prefix).unwrap().classify(&record).category;
            assert!(level >= previous, "prefix {} lowered the category", n);
            previous = level;
        }
        assert_eq!(previous, RiskLevel::Critical);
    }

    #[test]
    fn test_no_matches_stays_low_with_no_reasons() {
        let result = sharing().classify(&AuditableRecord::new("clean"));
        assert_eq!(result.category, RiskLevel::Low);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let record = AuditableRecord::new("share-3")
            .with_attr("isExternal", true)
            .with_attr("permissionRole", "edit")
            .with_attr("email", "x@gmail.com");
        let classifier = sharing();
        assert_eq!(classifier.classify(&record), classifier.classify(&record));
    }

    #[test]
    fn test_reasons_are_not_deduplicated() {
        let record = AuditableRecord::new("x").with_attr("flag", true);
        let set = RuleSet::categorical(vec![
            Rule::escalate("one", RiskLevel::Medium, Condition::is_true("flag"), "same"),
            Rule::escalate("two", RiskLevel::High, Condition::is_true("flag"), "same"),
        ]);
        let result = CategoricalClassifier::new(set).unwrap().classify(&record);
        assert_eq!(result.reasons, vec!["same", "same"]);
        assert_eq!(result.category, RiskLevel::High);
    }

    #[test]
    fn test_wrong_variant_is_rejected() {
        let err = ScoringClassifier::new(builtin::oversharing()).unwrap_err();
        assert!(matches!(err, RuleError::WrongVariant { expected: "scoring", .. }));
        assert!(CategoricalClassifier::new(builtin::label_coverage()).is_err());
    }

    #[test]
    fn test_label_scores() {
        let classifier = ScoringClassifier::new(builtin::label_coverage()).unwrap();
        let labeled = AuditableRecord::new("d1").with_attr("hasLabel", true);
        let unlabeled = AuditableRecord::new("d2").with_attr("hasLabel", false);
        assert_eq!(classifier.classify(&labeled).category, Score::MAX);
        assert_eq!(classifier.classify(&unlabeled).category, Score::MIN);
        assert_eq!(classifier.classify(&AuditableRecord::new("d3")).category, Score::MIN);
    }
}
