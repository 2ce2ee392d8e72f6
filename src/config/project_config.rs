//! Project-level configuration support
//!
//! Loads per-project configuration from `readiness.toml` or
//! `.readinessrc.json` in the audit directory.
//!
//! # Configuration Format
//!
//! ```toml
//! # readiness.toml
//!
//! [defaults]
//! format = "text"
//! min_risk = "low"
//! fail_below = "nearly-ready"
//!
//! [domains.access-policies]
//! min_records = 3
//!
//! [domains.access-policies.rules.no-mfa]
//! adjust = -25
//!
//! [domains.external-sharing.rules.dormant-account]
//! enabled = false
//!
//! [[domains.external-sharing.extra_rules]]
//! id = "guest-owner"
//! reason = "Guest account owns the item"
//! when = { op = "is_true", attr = "guestOwner" }
//! effect = { escalate = "high" }
//! ```

use crate::audit::DomainProfile;
use crate::models::{AuditDomain, RiskLevel};
use crate::rules::{builtin, Effect, Rule};
use crate::scoring::VerdictPolicy;
use anyhow::Context;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, warn};

/// File names searched, in order
pub const PROJECT_CONFIG_FILES: [&str; 2] = ["readiness.toml", ".readinessrc.json"];

/// Project-level configuration loaded from readiness.toml or similar
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProjectConfig {
    /// Default CLI flags
    #[serde(default)]
    pub defaults: CliDefaults,

    /// Per-domain settings, keyed by domain name (aliases accepted)
    #[serde(default)]
    pub domains: BTreeMap<String, DomainConfig>,
}

/// Default values for CLI flags
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CliDefaults {
    /// Default output format (text, json, markdown, csv)
    #[serde(default)]
    pub format: Option<String>,

    /// Default minimum risk shown in finding listings
    #[serde(default)]
    pub min_risk: Option<String>,

    /// Exit non-zero when the overall verdict is below this
    #[serde(default)]
    pub fail_below: Option<String>,

    /// Default number of findings listed per domain
    #[serde(default)]
    pub top: Option<usize>,
}

/// Settings for one audit domain
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DomainConfig {
    /// Records required before any verdict but Not Ready
    #[serde(default)]
    pub min_records: Option<usize>,

    /// Overrides for built-in rules, keyed by rule id
    #[serde(default)]
    pub rules: HashMap<String, RuleOverride>,

    /// Rules appended after the built-in ones
    #[serde(default)]
    pub extra_rules: Vec<Rule>,
}

/// Override for a single built-in rule
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleOverride {
    /// Whether the rule runs (default: true)
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Replacement delta for scoring rules
    #[serde(default)]
    pub adjust: Option<i32>,

    /// Replacement ceiling for categorical rules
    #[serde(default)]
    pub escalate: Option<RiskLevel>,
}

impl ProjectConfig {
    /// Settings for a domain, matching keys through domain aliases
    pub fn domain(&self, domain: AuditDomain) -> Option<&DomainConfig> {
        self.domains
            .iter()
            .find(|(key, _)| key.parse::<AuditDomain>().ok() == Some(domain))
            .map(|(_, config)| config)
    }

    /// Domain keys that don't name a known domain
    pub fn unknown_domains(&self) -> Vec<&str> {
        let mut unknown: Vec<&str> = self
            .domains
            .keys()
            .filter(|key| key.parse::<AuditDomain>().is_err())
            .map(|key| key.as_str())
            .collect();
        unknown.sort();
        unknown
    }

    /// Domains configured under more than one key, e.g. `ca` and `access-policies`
    pub fn alias_conflicts(&self) -> Vec<(AuditDomain, Vec<&str>)> {
        AuditDomain::ALL
            .iter()
            .filter_map(|domain| {
                let keys: Vec<&str> = self
                    .domains
                    .keys()
                    .filter(|key| key.parse::<AuditDomain>().ok() == Some(*domain))
                    .map(|key| key.as_str())
                    .collect();
                (keys.len() > 1).then_some((*domain, keys))
            })
            .collect()
    }

    fn check_aliases(&self) -> anyhow::Result<()> {
        if let Some((domain, keys)) = self.alias_conflicts().into_iter().next() {
            let tables: Vec<String> = keys.iter().map(|k| format!("[domains.{}]", k)).collect();
            anyhow::bail!(
                "Domain {} is configured more than once: {}",
                domain,
                tables.join(", ")
            );
        }
        Ok(())
    }

    /// Built-in profile with this config's overrides applied
    pub fn profile(&self, domain: AuditDomain) -> anyhow::Result<DomainProfile> {
        self.check_aliases()?;
        let mut rules = builtin::for_domain(domain);
        let mut policy = VerdictPolicy::for_domain(domain);

        if let Some(config) = self.domain(domain) {
            if let Some(min) = config.min_records {
                policy.min_records = min;
            }

            let mut ids: Vec<&String> = config.rules.keys().collect();
            ids.sort();
            for id in ids {
                let over = &config.rules[id];
                if rules.get(id).is_none() {
                    warn!("Unknown rule '{}' in [domains.{}.rules]", id, domain);
                    continue;
                }
                if over.adjust.is_some() && over.escalate.is_some() {
                    anyhow::bail!(
                        "Rule '{}' in [domains.{}.rules] sets both adjust and escalate; set only one",
                        id,
                        domain
                    );
                }
                if over.enabled == Some(false) {
                    debug!("Disabled rule {}/{}", domain, id);
                    rules.remove(id);
                    continue;
                }
                if let Some(delta) = over.adjust {
                    rules.set_effect(id, Effect::Adjust(delta));
                }
                if let Some(level) = over.escalate {
                    rules.set_effect(id, Effect::Escalate(level));
                }
            }

            rules.rules.extend(config.extra_rules.iter().cloned());
        }

        DomainProfile::new(domain, rules, policy)
            .with_context(|| format!("Invalid rule configuration for {}", domain))
    }
}

/// Load project configuration from the audit directory
///
/// Searches for config files in order:
/// 1. readiness.toml
/// 2. .readinessrc.json
///
/// Returns default config if no file is found or a file fails to parse.
pub fn load_project_config(dir: &Path) -> ProjectConfig {
    for name in PROJECT_CONFIG_FILES {
        let path = dir.join(name);
        if !path.exists() {
            continue;
        }
        match load_project_config_file(&path) {
            Ok(config) => {
                debug!("Loaded project config from {}", path.display());
                return config;
            }
            Err(e) => {
                warn!("Failed to load {}: {:#}", path.display(), e);
            }
        }
    }

    debug!("No project config found, using defaults");
    ProjectConfig::default()
}

/// Load a specific config file; JSON when the extension says so, TOML otherwise
pub fn load_project_config_file(path: &Path) -> anyhow::Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ProjectConfig = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)?
    };
    config
        .check_aliases()
        .with_context(|| format!("Invalid config {}", path.display()))?;
    for key in config.unknown_domains() {
        warn!("Ignoring unknown domain '{}' in {}", key, path.display());
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditableRecord, Category, Verdict};

    const SAMPLE: &str = r#"
[defaults]
format = "json"
fail_below = "requires-work"

[domains.ca]
min_records = 2

[domains.ca.rules.no-mfa]
adjust = -50

[domains.external-sharing.rules.dormant-account]
enabled = false

[[domains.external-sharing.extra_rules]]
id = "guest-owner"
reason = "Guest account owns the item"
when = { op = "is_true", attr = "guestOwner" }
effect = { escalate = "high" }
"#;

    #[test]
    fn test_parse_sample() {
        let config: ProjectConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.defaults.format.as_deref(), Some("json"));
        assert!(config.domain(AuditDomain::AccessPolicies).is_some());
        assert!(config.domain(AuditDomain::Oversharing).is_none());
        assert!(config.unknown_domains().is_empty());
    }

    #[test]
    fn test_adjust_override_and_min_records() {
        let config: ProjectConfig = toml::from_str(SAMPLE).unwrap();
        let profile = config.profile(AuditDomain::AccessPolicies).unwrap();
        assert_eq!(profile.policy().min_records, 2);

        let record = AuditableRecord::new("p").with_attr("requiresMFA", false);
        let result = profile.engine.classify(&record);
        assert_eq!(result.category.score(), Some(50));
    }

    #[test]
    fn test_disable_and_extra_rules() {
        let config: ProjectConfig = toml::from_str(SAMPLE).unwrap();
        let profile = config.profile(AuditDomain::ExternalSharing).unwrap();
        assert!(profile.rules().get("dormant-account").is_none());
        assert!(profile.rules().get("guest-owner").is_some());

        let dormant = AuditableRecord::new("u").with_attr("daysSinceActivity", 400);
        assert_eq!(profile.engine.classify(&dormant).category.risk(), RiskLevel::Low);
        let owner = AuditableRecord::new("g").with_attr("guestOwner", true);
        assert_eq!(profile.engine.classify(&owner).category.risk(), RiskLevel::High);
    }

    #[test]
    fn test_mismatched_override_is_an_error() {
        let config: ProjectConfig = toml::from_str(
            r#"
[domains.oversharing.rules.everyone-group]
adjust = -10
"#,
        )
        .unwrap();
        assert!(config.profile(AuditDomain::Oversharing).is_err());
    }

    #[test]
    fn test_zero_min_records_still_not_ready_when_empty() {
        let config: ProjectConfig = toml::from_str(
            r#"
[domains.oversharing]
min_records = 0
"#,
        )
        .unwrap();
        let profile = config.profile(AuditDomain::Oversharing).unwrap();
        let summary = profile.aggregator.aggregate::<RiskLevel>(&[]);
        assert_eq!(summary.verdict, Verdict::NotReady);
    }

    #[test]
    fn test_load_prefers_toml_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_project_config(dir.path()).domains.is_empty());

        std::fs::write(
            dir.path().join(".readinessrc.json"),
            r#"{ "defaults": { "format": "csv" } }"#,
        )
        .unwrap();
        assert_eq!(
            load_project_config(dir.path()).defaults.format.as_deref(),
            Some("csv")
        );

        std::fs::write(dir.path().join("readiness.toml"), "[defaults]\nformat = \"markdown\"\n")
            .unwrap();
        assert_eq!(
            load_project_config(dir.path()).defaults.format.as_deref(),
            Some("markdown")
        );

        // Broken TOML falls through to JSON
        std::fs::write(dir.path().join("readiness.toml"), "[defaults\n").unwrap();
        assert_eq!(
            load_project_config(dir.path()).defaults.format.as_deref(),
            Some("csv")
        );
    }

    #[test]
    fn test_alias_collision_is_rejected() {
        let content = "[domains.ca]\nmin_records = 2\n\n[domains.access-policies]\nmin_records = 7\n";
        let config: ProjectConfig = toml::from_str(content).unwrap();
        assert_eq!(
            config.alias_conflicts(),
            vec![(AuditDomain::AccessPolicies, vec!["access-policies", "ca"])]
        );
        let err = config.profile(AuditDomain::AccessPolicies).unwrap_err().to_string();
        assert!(err.contains("[domains.access-policies], [domains.ca]"), "{}", err);
        // Other domains are unaffected by the lookup, but the config is still invalid
        assert!(config.profile(AuditDomain::Oversharing).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readiness.toml");
        std::fs::write(&path, content).unwrap();
        assert!(load_project_config_file(&path).is_err());
        assert!(load_project_config(dir.path()).domains.is_empty());
    }

    #[test]
    fn test_single_alias_key_is_found() {
        let config: ProjectConfig = toml::from_str("[domains.labels]\nmin_records = 4\n").unwrap();
        assert!(config.alias_conflicts().is_empty());
        let profile = config.profile(AuditDomain::LabelCoverage).unwrap();
        assert_eq!(profile.policy().min_records, 4);
    }

    #[test]
    fn test_adjust_and_escalate_together_are_rejected() {
        let config: ProjectConfig = toml::from_str(
            r#"
[domains.oversharing.rules.everyone-group]
adjust = -10
escalate = "high"
"#,
        )
        .unwrap();
        let err = config.profile(AuditDomain::Oversharing).unwrap_err().to_string();
        assert!(err.contains("both adjust and escalate"), "{}", err);
        assert!(err.contains("everyone-group"));
    }

    #[test]
    fn test_unknown_domains_reported() {
        let config: ProjectConfig = toml::from_str("[domains.mailboxes]\nmin_records = 1\n").unwrap();
        assert_eq!(config.unknown_domains(), vec!["mailboxes"]);
    }
}
