//! Rules command - print the effective rule sets

use crate::audit::DomainProfile;
use crate::config::ProjectConfig;
use crate::models::AuditDomain;
use crate::rules::{Effect, Variant};
use anyhow::Result;
use console::style;
use std::str::FromStr;

pub fn run(domain: Option<&str>, json: bool, project: &ProjectConfig) -> Result<()> {
    let domains = match domain {
        Some(d) => vec![AuditDomain::from_str(d)?],
        None => AuditDomain::ALL.to_vec(),
    };
    let profiles = domains
        .iter()
        .map(|d| project.profile(*d))
        .collect::<Result<Vec<_>>>()?;

    if json {
        let value: serde_json::Map<String, serde_json::Value> = profiles
            .iter()
            .map(|p| {
                (
                    p.domain.to_string(),
                    serde_json::json!({ "rules": p.rules(), "policy": p.policy() }),
                )
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    for profile in &profiles {
        print_profile(profile);
    }
    Ok(())
}

fn print_profile(profile: &DomainProfile) {
    let rules = profile.rules();
    let variant = match rules.variant {
        Variant::Scoring { baseline } => format!("scoring, baseline {}", baseline),
        Variant::Categorical => "categorical, starts at low".to_string(),
    };
    println!(
        "\n{} {}",
        style(profile.domain.title()).bold(),
        style(format!("({})", variant)).dim()
    );

    for rule in &rules.rules {
        let effect = match rule.effect {
            Effect::Adjust(delta) => format!("{:+}", delta),
            Effect::Escalate(level) => level.to_string(),
        };
        println!(
            "  {:<28} {:>8}  {}",
            style(&rule.id).cyan(),
            effect,
            rule.when.describe()
        );
        if !rule.reason.is_empty() {
            println!("  {:<28} {:>8}  {}", "", "", style(&rule.reason).dim());
        }
    }

    let policy = profile.policy();
    println!("  {}", style(format!("verdicts (min {} record(s)):", policy.min_records)).dim());
    for rule in &policy.rules {
        let thresholds: Vec<String> = rule.all.iter().map(|t| t.describe()).collect();
        println!("    {:<14} {}", rule.verdict.label(), thresholds.join(" and "));
    }
}
