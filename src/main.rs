mod config;
mod models;
mod services;

use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::updater::Updater;

/// Diagnostic trace goes to the console and to this file
const LOG_FILE: &str = "iptv_updater.log";

fn init_tracing() -> anyhow::Result<()> {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "iptv_updater=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(log_file)),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables
    dotenvy::dotenv().ok();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let config = Config::from_env();
    tracing::info!("Starting IPTV updater v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "{} seed sources, output file: {}",
        config.sources.len() + config.backup_sources.len(),
        config.output_file
    );

    match Updater::new(config).run().await {
        Ok(count) => {
            tracing::info!("Update finished: {} channels", count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Update failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
