// SPDX-FileCopyrightText: 2026 Tabkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tabkeep - inspect and maintain a persisted tab session store.
//!
//! This is the binary entry point. It works directly on the SQLite store, so
//! it can be run while no browser host is attached.

mod transfer;
mod windows;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::debug;

use tabkeep_config::TabkeepConfig;
use tabkeep_core::TabkeepError;
use tabkeep_session::{QueueCache, SnapshotStore};
use tabkeep_storage::{Repositories, SqliteStorage};

/// Tabkeep - inspect and maintain a persisted tab session store.
#[derive(Parser, Debug)]
#[command(name = "tabkeep", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard lookup.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List inactive windows with their tab trees.
    Windows {
        /// Print the stored windows as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Export inactive windows to a JSON document.
    Export {
        /// Write to this file instead of stdout.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Append inactive windows from an export document.
    Import {
        /// Export document to read.
        file: PathBuf,
    },
    /// Evict expired and excess queue cache entries.
    Prune,
    /// Validate and print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => tabkeep_config::load_and_validate_path(path),
        None => tabkeep_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            tabkeep_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);
    debug!(database = %config.storage.database_path, "config loaded");

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Option<Commands>, config: &TabkeepConfig) -> Result<(), TabkeepError> {
    let command = match command {
        Some(Commands::Config) => return print_config(config),
        Some(command) => command,
        None => {
            println!("tabkeep: use --help for available commands");
            return Ok(());
        }
    };

    let storage = Arc::new(SqliteStorage::open(config.storage.clone()).await?);
    let repos = Repositories::new(storage.clone());
    let snapshots = SnapshotStore::new(&repos);

    let result = match command {
        Commands::Windows { json } => windows::run_windows(&snapshots, json).await,
        Commands::Export { output } => transfer::run_export(&snapshots, output.as_deref()).await,
        Commands::Import { file } => transfer::run_import(&snapshots, &file).await,
        Commands::Prune => run_prune(&QueueCache::new(&repos, &config.queue)).await,
        Commands::Config => print_config(config),
    };
    storage.close().await?;
    result
}

fn print_config(config: &TabkeepConfig) -> Result<(), TabkeepError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| TabkeepError::Config(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

async fn run_prune(queues: &QueueCache) -> Result<(), TabkeepError> {
    let removed = queues.prune().await?;
    let (canonical, session) = queues.counts().await?;
    println!(
        "pruned {removed} queue record(s); {canonical} canonical and {session} per-tab remain"
    );
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tabkeep={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
