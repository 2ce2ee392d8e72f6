//! Built-in rule sets for the four audit domains
//!
//! Attribute names follow the tenant export field names.

use super::{Condition, Rule, RuleSet};
use crate::models::{AuditDomain, RiskLevel};

/// Consumer mail providers flagged by the external sharing audit
pub const CONSUMER_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "outlook.com",
    "hotmail.com",
    "live.com",
    "msn.com",
    "yahoo.com",
    "icloud.com",
    "me.com",
    "aol.com",
    "proton.me",
    "protonmail.com",
    "gmx.com",
];

/// Days without sign-in before an external account counts as dormant
pub const DORMANT_AFTER_DAYS: f64 = 90.0;

/// Member count above which a group share is "large"
pub const LARGE_GROUP_MEMBERS: f64 = 500.0;

/// Member count above which a security-group share overshares content
pub const LARGE_SECURITY_GROUP_MEMBERS: f64 = 1000.0;

/// Default rule set for a domain
pub fn for_domain(domain: AuditDomain) -> RuleSet {
    match domain {
        AuditDomain::AccessPolicies => access_policies(),
        AuditDomain::ExternalSharing => external_sharing(),
        AuditDomain::LabelCoverage => label_coverage(),
        AuditDomain::Oversharing => oversharing(),
    }
}

/// Conditional Access compatibility: scoring variant from 100
pub fn access_policies() -> RuleSet {
    RuleSet::scoring(
        100,
        vec![
            Rule::adjust(
                "mfa-enforced",
                0,
                Condition::is_true("requiresMFA"),
                "MFA enforced for AI tools",
            ),
            Rule::adjust(
                "no-mfa",
                -20,
                Condition::is_false("requiresMFA"),
                "No MFA requirement for AI tools",
            ),
            Rule::adjust(
                "no-device-compliance",
                -15,
                Condition::is_false("requiresCompliantDevice"),
                "No compliant device requirement",
            ),
            Rule::adjust(
                "block-all-without-exemption",
                -30,
                Condition::all(vec![
                    Condition::is_true("blocksAllCloudApps"),
                    Condition::is_false("excludesAssistantApps"),
                ]),
                "Blocks all cloud apps without exempting AI assistant applications",
            ),
            Rule::adjust(
                "short-reauth-interval",
                -10,
                Condition::at_most("signInFrequencyHours", 1.0),
                "Sign-in frequency of one hour or less interrupts AI sessions",
            ),
        ],
    )
}

/// External sharing risk: categorical
pub fn external_sharing() -> RuleSet {
    RuleSet::categorical(vec![
        Rule::escalate(
            "shared-with-everyone",
            RiskLevel::Critical,
            Condition::is_true("sharedWithEveryone"),
            "Shared with everyone",
        ),
        Rule::escalate(
            "anonymous-link",
            RiskLevel::Critical,
            Condition::is_true("anonymousLink"),
            "Anonymous link allows access without sign-in",
        ),
        Rule::escalate(
            "external-edit-access",
            RiskLevel::High,
            Condition::all(vec![
                Condition::is_true("isExternal"),
                Condition::one_of("permissionRole", &["write", "edit", "owner", "fullControl"]),
            ]),
            "External party has edit access",
        ),
        Rule::escalate(
            "large-group",
            RiskLevel::Medium,
            Condition::at_least("groupMemberCount", LARGE_GROUP_MEMBERS),
            "Shared with a large group",
        ),
        Rule::escalate(
            "dormant-account",
            RiskLevel::Medium,
            Condition::at_least("daysSinceActivity", DORMANT_AFTER_DAYS),
            "External account inactive for 90 days or more",
        ),
        Rule::escalate(
            "consumer-email-domain",
            RiskLevel::Medium,
            Condition::domain_in("email", CONSUMER_EMAIL_DOMAINS),
            "Shared with a consumer email domain",
        ),
    ])
}

/// Sensitivity label coverage: each document scores 100 when labeled, 0
/// otherwise, so the average score is the labeled percentage.
pub fn label_coverage() -> RuleSet {
    RuleSet::scoring(
        0,
        vec![
            Rule::adjust(
                "labeled",
                100,
                Condition::is_true("hasLabel"),
                "Sensitivity label applied",
            ),
            Rule::adjust(
                "unlabeled",
                0,
                Condition::is_false("hasLabel"),
                "No sensitivity label",
            ),
        ],
    )
}

/// Oversharing content scan: categorical, keyed by principal type
pub fn oversharing() -> RuleSet {
    RuleSet::categorical(vec![
        Rule::escalate(
            "everyone-group",
            RiskLevel::Critical,
            Condition::any(vec![
                Condition::equals("sharedWithPrincipal", "Everyone"),
                Condition::equals("principalType", "everyone"),
            ]),
            "Shared with Everyone group",
        ),
        Rule::escalate(
            "anonymous-link",
            RiskLevel::Critical,
            Condition::any(vec![
                Condition::equals("principalType", "anonymousLink"),
                Condition::is_true("anonymousLink"),
            ]),
            "Reachable through an anonymous link",
        ),
        Rule::escalate(
            "everyone-except-external",
            RiskLevel::High,
            Condition::any(vec![
                Condition::equals("sharedWithPrincipal", "Everyone except external users"),
                Condition::equals("principalType", "everyoneExceptExternal"),
            ]),
            "Shared with Everyone except external users",
        ),
        Rule::escalate(
            "large-security-group",
            RiskLevel::Medium,
            Condition::all(vec![
                Condition::equals("principalType", "securityGroup"),
                Condition::at_least("memberCount", LARGE_SECURITY_GROUP_MEMBERS),
            ]),
            "Shared with a security group of 1000 or more members",
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sets_validate() {
        for domain in AuditDomain::ALL {
            let set = for_domain(domain);
            assert!(set.validate().is_ok(), "{} rule set invalid", domain);
            assert!(!set.rules.is_empty());
        }
    }

    #[test]
    fn test_consumer_domains_are_lowercase() {
        for d in CONSUMER_EMAIL_DOMAINS {
            assert_eq!(*d, d.to_lowercase());
        }
    }
}
