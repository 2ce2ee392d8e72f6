//! Rule sets for record classification
//!
//! A rule set is an ordered list of rules of one variant:
//! - **scoring**: start from a baseline and apply additive deltas
//! - **categorical**: start at `Low` and escalate toward each rule's ceiling
//!
//! Rule sets are plain data. The built-in sets live in [`builtin`]; project
//! config can disable rules, change their effect, or append new ones.
//!
//! # Configuration Format
//!
//! ```toml
//! [[domains.external-sharing.extra_rules]]
//! id = "guest-owner"
//! reason = "Guest account owns the item"
//! when = { op = "is_true", attr = "guestOwner" }
//! effect = { escalate = "high" }
//! ```

pub mod builtin;

use crate::models::{AuditableRecord, RiskLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while validating a rule set
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuleError {
    #[error("rule #{index} has an empty id")]
    EmptyId { index: usize },

    #[error("duplicate rule id '{0}'")]
    DuplicateId(String),

    #[error("rule '{rule}' uses a {found} effect in a {variant} rule set")]
    EffectMismatch {
        rule: String,
        found: &'static str,
        variant: &'static str,
    },

    #[error("baseline {0} is outside 0..=100")]
    BaselineOutOfRange(i32),

    #[error("expected a {expected} rule set, found {found}")]
    WrongVariant {
        expected: &'static str,
        found: &'static str,
    },
}

/// Predicate over a record's attributes
///
/// A leaf predicate whose attribute is missing, null, or of the wrong type
/// never matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    IsTrue { attr: String },
    IsFalse { attr: String },
    /// Case-insensitive text equality
    Equals { attr: String, value: String },
    /// Text equal to any value, or a list sharing any value
    OneOf { attr: String, values: Vec<String> },
    AtLeast { attr: String, value: f64 },
    AtMost { attr: String, value: f64 },
    LessThan { attr: String, value: f64 },
    GreaterThan { attr: String, value: f64 },
    /// Email address or host name under any of the given domains
    DomainIn { attr: String, domains: Vec<String> },
    All { conditions: Vec<Condition> },
    Any { conditions: Vec<Condition> },
}

impl Condition {
    pub fn is_true(attr: &str) -> Self {
        Condition::IsTrue { attr: attr.to_string() }
    }

    pub fn is_false(attr: &str) -> Self {
        Condition::IsFalse { attr: attr.to_string() }
    }

    pub fn equals(attr: &str, value: &str) -> Self {
        Condition::Equals {
            attr: attr.to_string(),
            value: value.to_string(),
        }
    }

    pub fn one_of(attr: &str, values: &[&str]) -> Self {
        Condition::OneOf {
            attr: attr.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn at_least(attr: &str, value: f64) -> Self {
        Condition::AtLeast { attr: attr.to_string(), value }
    }

    pub fn at_most(attr: &str, value: f64) -> Self {
        Condition::AtMost { attr: attr.to_string(), value }
    }

    pub fn less_than(attr: &str, value: f64) -> Self {
        Condition::LessThan { attr: attr.to_string(), value }
    }

    pub fn greater_than(attr: &str, value: f64) -> Self {
        Condition::GreaterThan { attr: attr.to_string(), value }
    }

    pub fn domain_in(attr: &str, domains: &[&str]) -> Self {
        Condition::DomainIn {
            attr: attr.to_string(),
            domains: domains.iter().map(|d| d.to_string()).collect(),
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::All { conditions }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Any { conditions }
    }

    /// Evaluate against a record. Pure; never fails.
    pub fn matches(&self, record: &AuditableRecord) -> bool {
        match self {
            Condition::IsTrue { attr } => {
                record.attr(attr).and_then(|v| v.as_bool()) == Some(true)
            }
            Condition::IsFalse { attr } => {
                record.attr(attr).and_then(|v| v.as_bool()) == Some(false)
            }
            Condition::Equals { attr, value } => record
                .attr(attr)
                .and_then(|v| v.as_str())
                .is_some_and(|s| s.trim().eq_ignore_ascii_case(value)),
            Condition::OneOf { attr, values } => match record.attr(attr) {
                Some(v) => {
                    let contains = |s: &str| values.iter().any(|x| x.eq_ignore_ascii_case(s.trim()));
                    if let Some(s) = v.as_str() {
                        contains(s)
                    } else if let Some(list) = v.as_list() {
                        list.iter().any(|s| contains(s.as_str()))
                    } else {
                        false
                    }
                }
                None => false,
            },
            Condition::AtLeast { attr, value } => numeric(record, attr).is_some_and(|n| n >= *value),
            Condition::AtMost { attr, value } => numeric(record, attr).is_some_and(|n| n <= *value),
            Condition::LessThan { attr, value } => numeric(record, attr).is_some_and(|n| n < *value),
            Condition::GreaterThan { attr, value } => {
                numeric(record, attr).is_some_and(|n| n > *value)
            }
            Condition::DomainIn { attr, domains } => match record.attr(attr) {
                Some(v) => {
                    if let Some(s) = v.as_str() {
                        in_domains(s, domains)
                    } else if let Some(list) = v.as_list() {
                        list.iter().any(|s| in_domains(s, domains))
                    } else {
                        false
                    }
                }
                None => false,
            },
            // Empty groups never match: no vacuous truth
            Condition::All { conditions } => {
                !conditions.is_empty() && conditions.iter().all(|c| c.matches(record))
            }
            Condition::Any { conditions } => conditions.iter().any(|c| c.matches(record)),
        }
    }

    /// Human-readable form for rule listings
    pub fn describe(&self) -> String {
        match self {
            Condition::IsTrue { attr } => format!("{attr} is true"),
            Condition::IsFalse { attr } => format!("{attr} is false"),
            Condition::Equals { attr, value } => format!("{attr} = \"{value}\""),
            Condition::OneOf { attr, values } => format!("{attr} in [{}]", values.join(", ")),
            Condition::AtLeast { attr, value } => format!("{attr} >= {value}"),
            Condition::AtMost { attr, value } => format!("{attr} <= {value}"),
            Condition::LessThan { attr, value } => format!("{attr} < {value}"),
            Condition::GreaterThan { attr, value } => format!("{attr} > {value}"),
            Condition::DomainIn { attr, domains } => {
                format!("{attr} under [{}]", domains.join(", "))
            }
            Condition::All { conditions } => join_described(conditions, " and "),
            Condition::Any { conditions } => join_described(conditions, " or "),
        }
    }
}

fn numeric(record: &AuditableRecord, attr: &str) -> Option<f64> {
    record.attr(attr).and_then(|v| v.as_f64())
}

/// Match an email address or host against a domain list (suffix-aware)
fn in_domains(value: &str, domains: &[String]) -> bool {
    let value = value.trim().to_lowercase();
    let host = value.rsplit_once('@').map(|(_, h)| h).unwrap_or(&value);
    if host.is_empty() {
        return false;
    }
    domains.iter().any(|d| {
        let d = d.trim().trim_start_matches('@').to_lowercase();
        host == d || host.ends_with(&format!(".{d}"))
    })
}

fn join_described(conditions: &[Condition], sep: &str) -> String {
    let parts: Vec<String> = conditions.iter().map(|c| c.describe()).collect();
    format!("({})", parts.join(sep))
}

/// What a matching rule does to the running classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Scoring variant: add this delta to the running total
    Adjust(i32),
    /// Categorical variant: raise the category to at least this level
    Escalate(RiskLevel),
}

impl Effect {
    fn kind(&self) -> &'static str {
        match self {
            Effect::Adjust(_) => "adjust",
            Effect::Escalate(_) => "escalate",
        }
    }
}

/// A single classification rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    /// Appended to the result's reasons when the rule matches
    #[serde(default)]
    pub reason: String,
    pub when: Condition,
    pub effect: Effect,
}

impl Rule {
    pub fn adjust(id: &str, delta: i32, when: Condition, reason: &str) -> Self {
        Self {
            id: id.to_string(),
            reason: reason.to_string(),
            when,
            effect: Effect::Adjust(delta),
        }
    }

    pub fn escalate(id: &str, level: RiskLevel, when: Condition, reason: &str) -> Self {
        Self {
            id: id.to_string(),
            reason: reason.to_string(),
            when,
            effect: Effect::Escalate(level),
        }
    }
}

/// Which evaluation discipline a rule set follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Variant {
    Scoring { baseline: i32 },
    Categorical,
}

impl Variant {
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Scoring { .. } => "scoring",
            Variant::Categorical => "categorical",
        }
    }
}

/// An ordered list of rules sharing one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub variant: Variant,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn scoring(baseline: i32, rules: Vec<Rule>) -> Self {
        Self {
            variant: Variant::Scoring { baseline },
            rules,
        }
    }

    pub fn categorical(rules: Vec<Rule>) -> Self {
        Self {
            variant: Variant::Categorical,
            rules,
        }
    }

    /// Check ids and effect kinds before the set is used
    pub fn validate(&self) -> Result<(), RuleError> {
        if let Variant::Scoring { baseline } = self.variant {
            if !(0..=100).contains(&baseline) {
                return Err(RuleError::BaselineOutOfRange(baseline));
            }
        }

        let mut seen = HashSet::new();
        for (index, rule) in self.rules.iter().enumerate() {
            if rule.id.trim().is_empty() {
                return Err(RuleError::EmptyId { index });
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleError::DuplicateId(rule.id.clone()));
            }
            let compatible = matches!(
                (&self.variant, &rule.effect),
                (Variant::Scoring { .. }, Effect::Adjust(_))
                    | (Variant::Categorical, Effect::Escalate(_))
            );
            if !compatible {
                return Err(RuleError::EffectMismatch {
                    rule: rule.id.clone(),
                    found: rule.effect.kind(),
                    variant: self.variant.name(),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Remove a rule by id; returns whether it existed
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        self.rules.len() != before
    }

    /// Replace a rule's effect; returns whether it existed
    pub fn set_effect(&mut self, id: &str, effect: Effect) -> bool {
        match self.rules.iter_mut().find(|r| r.id == id) {
            Some(rule) => {
                rule.effect = effect;
                true
            }
            None => false,
        }
    }
}
