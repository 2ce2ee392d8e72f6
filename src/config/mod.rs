//! Configuration module for readiness audits
//!
//! This module handles:
//! - Project-level configuration (readiness.toml)
//! - Rule overrides and extra rules per domain
//! - CLI defaults
//! - User-level configuration (~/.config/readiness/config.toml)

mod project_config;
mod user_config;

pub use project_config::{
    load_project_config, load_project_config_file, CliDefaults, DomainConfig, ProjectConfig,
    RuleOverride, PROJECT_CONFIG_FILES,
};
pub use user_config::UserConfig;
