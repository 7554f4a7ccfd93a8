//! imalive agent binary
//!
//! Loads the monitor definitions, starts the polling loop in the background
//! and serves the gauges over HTTP on the main task.

mod cli;
mod server;

use anyhow::Context;
use clap::Parser;
use imalive_monitor::{init_tracing, AgentConfig, MetricsRegistry, MonitorScheduler, TracingSink};
use std::sync::Arc;
use tracing::info;

use cli::Cli;
use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "Starting imalive agent"
    );

    let config = AgentConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    let metrics = MetricsRegistry::new();
    let scheduler = MonitorScheduler::new(&config, &metrics, Arc::new(TracingSink), cli.wait())?;
    let state = AppState::new(metrics, scheduler.len());

    let polling = scheduler.spawn();
    let served = server::serve(cli.listen, state).await;

    polling.abort();
    served
}
