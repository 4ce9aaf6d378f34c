//! # Audit Subcommand
//!
//! `rdapct audit [--schema NAME]` lists the metadata keys classification
//! could request but the schemas do not provide.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use rdapct_classify::{audit, MetadataGap};

use crate::config::RdapctConfig;
use crate::validate::compile;

/// Arguments for the `rdapct audit` subcommand.
#[derive(Args, Debug)]
pub struct AuditArgs {
    /// Root schema to audit. Defaults to the configured schema.
    #[arg(long)]
    pub schema: Option<String>,

    /// Print gaps as a JSON array.
    #[arg(long)]
    pub json: bool,
}

/// Execute the audit subcommand.
///
/// Returns exit code: 0 without gaps, 1 otherwise.
pub fn run_audit(args: &AuditArgs, config: &RdapctConfig) -> Result<u8> {
    let gaps = collect_gaps(args, config)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&gaps)?);
    } else {
        for gap in &gaps {
            println!("{gap}");
        }
        println!("{} metadata gap(s)", gaps.len());
    }
    Ok(if gaps.is_empty() { 0 } else { 1 })
}

fn collect_gaps(args: &AuditArgs, config: &RdapctConfig) -> Result<Vec<MetadataGap>> {
    let schema_name = args.schema.as_deref().unwrap_or(&config.schema);
    let datasets = config.load_datasets()?;
    let schema = compile(config, schema_name, Arc::clone(&datasets))?;
    Ok(audit(schema.index()))
}
