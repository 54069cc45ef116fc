//! Retainer CLI entry point
//!
//! A simple script designed for CI with Portainer.

use clap::Parser;
use retainer::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Status messages go to stderr, pull progress to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    retainer::cli::deploy::execute(cli.deploy).await
}
