//! Domain profiles: a validated rule engine paired with its verdict policy

use crate::engine::Engine;
use crate::models::AuditDomain;
use crate::rules::{builtin, RuleError, RuleSet};
use crate::scoring::{Aggregator, VerdictPolicy};

/// Everything needed to audit one domain: its rules and its verdict policy
#[derive(Debug, Clone)]
pub struct DomainProfile {
    pub domain: AuditDomain,
    pub engine: Engine,
    pub aggregator: Aggregator,
}

impl DomainProfile {
    /// Validate `rules` and pair them with `policy`
    pub fn new(
        domain: AuditDomain,
        rules: RuleSet,
        policy: VerdictPolicy,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            domain,
            engine: Engine::from_rules(rules)?,
            aggregator: Aggregator::new(policy),
        })
    }

    /// Built-in rules and default policy
    pub fn builtin(domain: AuditDomain) -> Result<Self, RuleError> {
        Self::new(
            domain,
            builtin::for_domain(domain),
            VerdictPolicy::for_domain(domain),
        )
    }

    pub fn rules(&self) -> &RuleSet {
        self.engine.rules()
    }

    pub fn policy(&self) -> &VerdictPolicy {
        self.aggregator.policy()
    }
}
