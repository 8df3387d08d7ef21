//! Package importer binary.
//!
//! Reads a JSON array of packages, loads them into the configured catalog with the configured
//! match strategy and prints a JSON report of the batch.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use loader_config::shared::ImporterConfig;
use loader_config::{Environment, load_config};
use loader_telemetry::tracing::init_tracing;
use tracing::error;

use crate::core::{ImportRequest, start_import};

mod core;

/// Loads dataset packages into a data catalog.
#[derive(Parser, Debug)]
#[command(name = "loader-importer", version, about)]
struct Args {
    /// JSON file holding an array of packages
    #[arg(long)]
    packages: PathBuf,

    /// Group the loaded packages are added to, overriding the configured one
    #[arg(long)]
    group: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config::<ImporterConfig>().context("loading importer configuration")?;
    config
        .validate()
        .context("validating importer configuration")?;

    let environment = Environment::load()?;
    init_tracing(environment, "info").context("initializing tracing")?;

    let request = ImportRequest {
        packages_path: args.packages,
        group: args.group.or_else(|| config.group.clone()),
    };

    let succeeded = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async {
            match start_import(config, request).await {
                Ok(report) => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                    Ok::<_, anyhow::Error>(report.num_errors == 0)
                }
                Err(err) => {
                    error!("{err:#}");
                    Err(err)
                }
            }
        })?;

    if !succeeded {
        std::process::exit(1);
    }

    Ok(())
}
