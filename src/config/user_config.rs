//! User-level configuration for readiness audits
//!
//! Supports loading config from:
//! - Environment variables
//! - ~/.config/readiness/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Overrides the tenant name shown in reports
pub const TENANT_ENV: &str = "READINESS_TENANT";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Tenant name printed in report headers
    pub tenant: Option<String>,

    /// Preferred output format when neither the flag nor the project sets one
    pub format: Option<String>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/readiness/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(user_config) = Self::user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|content| toml::from_str::<UserConfig>(&content).ok())
        {
            config.merge(user_config);
        }

        if let Ok(tenant) = std::env::var(TENANT_ENV) {
            if !tenant.trim().is_empty() {
                config.report.tenant = Some(tenant);
            }
        }

        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("readiness").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        if other.report.tenant.is_some() {
            self.report.tenant = other.report.tenant;
        }
        if other.report.format.is_some() {
            self.report.format = other.report.format;
        }
    }

    pub fn tenant(&self) -> Option<&str> {
        self.report.tenant.as_deref()
    }

    pub fn format(&self) -> Option<&str> {
        self.report.format.as_deref()
    }

    /// Create the user config file with commented examples if missing
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        if !config_path.exists() {
            let example = r#"# Readiness Audit User Configuration

[report]
# Tenant name shown in report headers (READINESS_TENANT overrides this)
# tenant = "contoso.onmicrosoft.com"

# Output format when the project config doesn't set one
# format = "text"
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}
