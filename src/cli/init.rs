//! Init command - write a readiness.toml template

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

const TEMPLATE: &str = r#"# Readiness Audit project configuration
#
# Rule ids are listed by `readiness rules`.

[defaults]
# Output format (text, json, markdown, csv)
format = "text"

# Lowest risk listed in findings (critical, high, medium, low)
min_risk = "low"

# Exit code 1 when the overall verdict is below this
# fail_below = "nearly-ready"

# Findings listed per domain
# top = 50

[domains.access-policies]
# Policies that must be evaluated before any verdict but Not Ready
min_records = 1

# Change a scoring rule's delta
# [domains.access-policies.rules.no-mfa]
# adjust = -25

# Turn a rule off
# [domains.external-sharing.rules.dormant-account]
# enabled = false

# Change a categorical rule's ceiling
# [domains.oversharing.rules.large-security-group]
# escalate = "high"

# Add a rule after the built-in ones
# [[domains.external-sharing.extra_rules]]
# id = "guest-owner"
# reason = "Guest account owns the item"
# when = { op = "is_true", attr = "guestOwner" }
# effect = { escalate = "high" }
"#;

/// Run the init command
pub fn run(dir: &Path, force: bool) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Path is not a directory: {}", dir.display());
    }

    let config_path = dir.join("readiness.toml");
    if config_path.exists() && !force {
        println!(
            "{} Already initialized at {} (use --force to overwrite)",
            style("✓").green(),
            style(config_path.display()).cyan()
        );
        return Ok(());
    }

    std::fs::write(&config_path, TEMPLATE)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!(
        "{} Created {}",
        style("✓").green(),
        style(config_path.display()).cyan()
    );
    println!(
        "\nNext: {}",
        style("readiness audit all -i <snapshot-dir>").bold()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProjectConfig;

    #[test]
    fn test_template_parses() {
        let config: ProjectConfig = toml::from_str(TEMPLATE).unwrap();
        assert_eq!(config.defaults.format.as_deref(), Some("text"));
        assert!(config.unknown_domains().is_empty());
    }

    #[test]
    fn test_init_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("readiness.toml");
        std::fs::write(&path, "# mine\n").unwrap();
        run(dir.path(), false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");
        run(dir.path(), true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[defaults]"));
    }
}
