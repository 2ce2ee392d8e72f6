//! CLI command definitions and handlers

mod audit;
mod init;
mod rules;

use crate::config::{load_project_config, load_project_config_file, ProjectConfig, UserConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

pub use audit::AuditArgs;

/// Readiness Audit - AI assistant rollout readiness for cloud office tenants
#[derive(Parser, Debug)]
#[command(name = "readiness")]
#[command(
    version,
    about = "Score a tenant's readiness for an AI assistant rollout from exported snapshots",
    long_about = "Readiness Audit classifies exported tenant data (Conditional Access policies, \
external shares, sensitivity labels, shared content) with ordered rule sets and reduces \
each domain to a verdict: Ready, Nearly Ready, Requires Work or Not Ready.\n\n\
Everything runs locally against JSON snapshot files.",
    after_help = "\
Examples:
  readiness audit access-policies -i ca.json           Score Conditional Access policies
  readiness audit all -i snapshots/ --format markdown  Every domain found in a directory
  readiness audit oversharing -i scan.json --fail-below nearly-ready
  readiness rules external-sharing                      Show the effective rule set
  readiness init                                        Write a readiness.toml template"
)]
pub struct Cli {
    /// Project directory holding readiness.toml (default: current directory)
    #[arg(long, global = true, default_value = ".")]
    pub dir: PathBuf,

    /// Explicit project config file (overrides the search in --dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit one domain, or every domain found in the snapshots
    #[command(after_help = "\
Examples:
  readiness audit access-policies -i ca.json
  readiness audit external-sharing -i shares.json --min-risk high --top 20
  readiness audit label-coverage -i labels.json --format csv -o labels.csv
  readiness audit all -i snapshots/ --fail-below requires-work     Exit code 1 below threshold
  readiness audit external-sharing -i users.json --as-of 2026-10-01")]
    Audit(AuditArgs),

    /// List the effective rules and verdict policy per domain
    Rules {
        /// Domain to show (default: all four)
        domain: Option<String>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a readiness.toml with commented example settings
    Init {
        /// Overwrite an existing readiness.toml
        #[arg(long)]
        force: bool,
    },

    /// Manage configuration (init or show)
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create the user config file with example settings
    Init,
    /// Show current config and paths
    Show,
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Audit(ref args) => {
            let project = project_config(&cli)?;
            audit::run(args, &project)
        }

        Commands::Rules { ref domain, json } => {
            let project = project_config(&cli)?;
            rules::run(domain.as_deref(), json, &project)
        }

        Commands::Init { force } => init::run(&cli.dir, force),

        Commands::Config { ref action } => run_config_action(action, &cli),

        Commands::Version => {
            println!("readiness {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Explicit --config file, or the search in --dir
fn project_config(cli: &Cli) -> Result<ProjectConfig> {
    match &cli.config {
        Some(path) => load_project_config_file(path),
        None => Ok(load_project_config(&cli.dir)),
    }
}

fn found_project_config(dir: &Path) -> Option<PathBuf> {
    crate::config::PROJECT_CONFIG_FILES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn run_config_action(action: &ConfigAction, cli: &Cli) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = UserConfig::init_user_config()?;
            println!("{} Config initialized at: {}", style("✓").green(), path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let user = UserConfig::load()?;
            let user_path = UserConfig::user_config_path();

            println!("{}", style("User config").bold());
            match &user_path {
                Some(p) if p.exists() => println!("  {}", p.display()),
                Some(p) => println!("  {} {}", p.display(), style("(not created)").dim()),
                None => println!("  {}", style("(no config directory)").dim()),
            }

            println!("{}", style("Project config").bold());
            let project_path = cli.config.clone().or_else(|| found_project_config(&cli.dir));
            match project_path {
                Some(p) => println!("  {}", p.display()),
                None => println!("  {}", style("(none, using defaults)").dim()),
            }

            let project = project_config(cli)?;
            println!("{}", style("Resolved").bold());
            println!("  tenant: {}", user.tenant().unwrap_or("-"));
            println!(
                "  format: {}",
                project
                    .defaults
                    .format
                    .as_deref()
                    .or(user.format())
                    .unwrap_or("text")
            );
            if let Some(fail_below) = &project.defaults.fail_below {
                println!("  fail_below: {}", fail_below);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_audit_args() {
        let cli = Cli::try_parse_from([
            "readiness",
            "audit",
            "oversharing",
            "-i",
            "a.json",
            "-i",
            "b.json",
            "--fail-below",
            "nearly-ready",
        ])
        .unwrap();
        match cli.command {
            Commands::Audit(args) => {
                assert_eq!(args.domain, "oversharing");
                assert_eq!(args.input.len(), 2);
                assert_eq!(args.fail_below.as_deref(), Some("nearly-ready"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_audit_requires_input() {
        assert!(Cli::try_parse_from(["readiness", "audit", "oversharing"]).is_err());
    }
}
