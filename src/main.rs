//! # Fleetroute CLI
//!
//! Entrypoint for the VRP routing service: `serve` boots the HTTP API,
//! `inspect` and `datasets` are maintenance helpers for benchmark data.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use fleetroute::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    Cli::parse().run().await
}
