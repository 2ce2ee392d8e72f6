//! Record classification
//!
//! This module defines the core abstraction for turning one raw record into
//! a category plus reasons:
//! - `Classifier` trait implemented by both rule-set variants
//! - `Engine` for callers that pick the variant at runtime
//!
//! Classification is a pure function of the record's attributes. Anything
//! time-derived (e.g. `daysSinceActivity`) must already be on the record.

mod classifier;

pub use classifier::{CategoricalClassifier, ScoringClassifier};

use crate::models::{AuditableRecord, Category, ClassificationResult, RiskLevel, Score};
use crate::rules::{RuleError, RuleSet, Variant};
use serde::Serialize;

/// Trait for record classifiers
pub trait Classifier {
    type Category: Category;

    /// Classify a single record
    fn classify(&self, record: &AuditableRecord) -> ClassificationResult<Self::Category>;

    /// The rules this classifier evaluates, in order
    fn rules(&self) -> &RuleSet;
}

/// Category produced by an [`Engine`], whichever variant it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Outcome {
    Score(Score),
    Risk(RiskLevel),
}

impl Category for Outcome {
    fn risk(&self) -> RiskLevel {
        match self {
            Outcome::Score(s) => s.risk(),
            Outcome::Risk(r) => *r,
        }
    }

    fn score(&self) -> Option<u8> {
        match self {
            Outcome::Score(s) => Some(s.value()),
            Outcome::Risk(_) => None,
        }
    }
}

/// Classify one record against an ad hoc rule set
pub fn classify(
    rules: &RuleSet,
    record: &AuditableRecord,
) -> Result<ClassificationResult<Outcome>, RuleError> {
    Ok(Engine::from_rules(rules.clone())?.classify(record))
}

/// A classifier of either variant
#[derive(Debug, Clone)]
pub enum Engine {
    Scoring(ScoringClassifier),
    Categorical(CategoricalClassifier),
}

impl Engine {
    /// Validate a rule set and wrap it in the matching classifier
    pub fn from_rules(rules: RuleSet) -> Result<Self, RuleError> {
        match rules.variant {
            Variant::Scoring { .. } => Ok(Engine::Scoring(ScoringClassifier::new(rules)?)),
            Variant::Categorical => Ok(Engine::Categorical(CategoricalClassifier::new(rules)?)),
        }
    }

    pub fn classify(&self, record: &AuditableRecord) -> ClassificationResult<Outcome> {
        match self {
            Engine::Scoring(c) => map_category(c.classify(record), Outcome::Score),
            Engine::Categorical(c) => map_category(c.classify(record), Outcome::Risk),
        }
    }

    /// Classify every record independently, in input order
    pub fn classify_all<'a, I>(&self, records: I) -> Vec<ClassificationResult<Outcome>>
    where
        I: IntoIterator<Item = &'a AuditableRecord>,
    {
        records.into_iter().map(|r| self.classify(r)).collect()
    }

    pub fn rules(&self) -> &RuleSet {
        match self {
            Engine::Scoring(c) => c.rules(),
            Engine::Categorical(c) => c.rules(),
        }
    }
}

fn map_category<C, D>(result: ClassificationResult<C>, f: impl FnOnce(C) -> D) -> ClassificationResult<D> {
    ClassificationResult {
        subject_id: result.subject_id,
        category: f(result.category),
        reasons: result.reasons,
        matched_rules: result.matched_rules,
    }
}
