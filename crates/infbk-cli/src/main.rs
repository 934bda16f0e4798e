mod cli;
mod cmd;
mod format;
mod passphrase;
mod prompt;

use std::sync::Arc;

use clap::Parser;

use infbk_core::config;
use infbk_core::service::BackupService;
use infbk_core::store::{MemoryStore, Stores};

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // No config or store needed to write a starter config.
    if let Commands::Config { dest } = &cli.command {
        if let Err(e) = cmd::config::run_config(dest.as_deref()) {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
        return;
    }

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let (cfg, file) = config::load_resolved(cli.config.as_deref())?;
    match &file {
        Some(file) => tracing::info!("Using config: {file}"),
        None => tracing::info!("No config file found, using defaults"),
    }

    let store_path = cli
        .store
        .clone()
        .unwrap_or_else(|| cfg.store.resolved_path());
    let store = Arc::new(MemoryStore::open(&store_path)?);
    tracing::debug!(path = %store_path.display(), "document store opened");

    let codec = Arc::new(cfg.compression.codec()?);
    let service = BackupService::new(
        Stores::from_backend(store.clone()),
        codec,
        cfg.service_options(),
    );

    match &cli.command {
        Commands::Backup { project, user, out } => {
            cmd::backup::run_backup(&service, project, user, out)
        }
        Commands::Restore { user, archive } => {
            cmd::restore::run_restore(&service, &store, &store_path, user, archive)
        }
        Commands::Inspect { archive } => cmd::inspect::run_inspect(&service, archive),
        Commands::Config { .. } => Ok(()),
    }
}
