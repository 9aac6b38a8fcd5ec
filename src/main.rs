//! Recurring-Task Backend Server
//!
//! Serves a JSON task API where completing a task reschedules it after a
//! growing spaced-repetition interval.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use task_recur::api;
use task_recur::cli::Cli;
use task_recur::config::Config;
use task_recur::db::Database;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new().create(true).append(true).open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    // Load configuration, then layer env and CLI overrides on top
    let mut config = match &cli.config {
        Some(path) => Config::load(Path::new(path))?,
        None => Config::default(),
    };
    config.apply_env();

    if let Some(db_path) = &cli.database {
        config.db_path = db_path.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let db = Arc::new(Database::open(&config.db_path)?);
    info!("Opened task database at {}", config.db_path);

    let (shutdown_tx, _addr) = api::start_server(Arc::clone(&db), &config).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received ctrl-c, shutting down");
    let _ = shutdown_tx.send(());

    Ok(())
}
