//! Warden: application entry point.
//!
//! Loads the configured store snapshot and answers one role query given
//! on the command line, printing the answer as JSON.

mod cli;
mod config;
mod error;
mod query;

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use warden_db::{MemoryStore, Snapshot};

use crate::cli::Cli;
use crate::config::ServerConfig;
use crate::error::ServerError;

fn load(store: &MemoryStore, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(path) = &config.snapshot_path else {
        info!("no snapshot configured, starting with an empty store");
        return Ok(());
    };
    let json = std::fs::read_to_string(path)?;
    let rows = store.import(Snapshot::from_json(&json)?)?;
    info!(path = %path.display(), rows, "snapshot loaded");
    Ok(())
}

fn run(cli: &Cli) -> Result<(), ServerError> {
    let store = MemoryStore::new();
    load(&store, &cli.config)?;
    let answer = cli.query.run(&store.read_txn(), cli.config.resolver())?;
    println!("{}", serde_json::to_string_pretty(&answer)?);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let filter = EnvFilter::try_new(&cli.config.log_filter)
        .unwrap_or_else(|_| EnvFilter::new("warden=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!("Starting warden...");
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "query failed");
            ExitCode::FAILURE
        }
    }
}
