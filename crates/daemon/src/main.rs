// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! stashhogd: the StashHog core daemon.

use stashhog_daemon::{bootstrap, Config};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("stashhogd: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    std::fs::create_dir_all(config.log_dir())?;

    let file_appender = tracing_appender::rolling::daily(config.log_dir(), "stashhogd.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    info!(
        state_dir = %config.state_dir.display(),
        stash_url = %config.stash.url,
        workers = config.workers,
        "starting stashhogd"
    );

    let app = bootstrap::build(config)?;
    app.initialize().await;
    info!("stashhogd ready");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    app.shutdown().await;
    Ok(())
}
