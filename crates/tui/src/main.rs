mod app;
mod demo;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::Arc,
};

use parking_lot::Mutex;
use railhand_core::{
    config::{self, AppConfig},
    LocalReferee,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let board = demo::board(&config.demo)?;
    let referee = LocalReferee::new(board.clone(), demo::opening_context(&config.demo));
    let referee = Arc::new(Mutex::new(referee));

    let mut app = app::RailhandApp::new(&config, board, referee)?;
    app.run().await
}

// The terminal belongs to the UI, so logs only go to the file.
fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("railhand.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
