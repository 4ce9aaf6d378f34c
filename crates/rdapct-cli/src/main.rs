//! # rdapct CLI entry point
//!
//! Parses command-line arguments, resolves configuration and dispatches to
//! the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rdapct_cli::audit::{run_audit, AuditArgs};
use rdapct_cli::config::RdapctConfig;
use rdapct_cli::validate::{run_validate, ValidateArgs};

/// RDAP conformance checker.
///
/// Validates RDAP responses against the RDAP JSON schemas and reports every
/// violation as a coded diagnostic record.
#[derive(Parser, Debug)]
#[command(name = "rdapct", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file. Defaults to `rdapct.yaml` at the repository root.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Schema directory, overriding the configuration.
    #[arg(long, global = true)]
    schema_dir: Option<PathBuf>,

    /// Dataset snapshot (YAML), overriding the configuration.
    #[arg(long, global = true)]
    datasets: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an RDAP response and print its diagnostic records.
    Validate(ValidateArgs),

    /// List schema metadata gaps.
    Audit(AuditArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Records go to stdout; logs stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let repo_root = resolve_repo_root().unwrap_or_else(|| {
        tracing::warn!("Could not locate repository root; using current directory");
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    });
    tracing::debug!(repo_root = %repo_root.display(), "resolved repository root");

    let result = load_config(&cli, &repo_root).and_then(|config| match &cli.command {
        Commands::Validate(args) => run_validate(args, &config, &repo_root),
        Commands::Audit(args) => run_audit(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

fn load_config(cli: &Cli, repo_root: &std::path::Path) -> Result<RdapctConfig> {
    let mut config = match &cli.config {
        Some(path) => RdapctConfig::load(path)?,
        None => RdapctConfig::discover(repo_root)?,
    };
    if let Some(dir) = &cli.schema_dir {
        config.schema_dir = dir.clone();
    }
    if let Some(path) = &cli.datasets {
        config.datasets = Some(path.clone());
    }
    Ok(config)
}

/// Walk up from the current directory to the first directory holding a
/// `schemas/` directory.
fn resolve_repo_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut dir = cwd.as_path();
    loop {
        if dir.join("schemas").is_dir() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}
