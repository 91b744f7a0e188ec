use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_layered(cli.config.as_deref())
        .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.logging_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
    tracing::debug!(config = ?config, "Configuration loaded");

    match cli.command {
        Commands::Index(args) => commands::index::run(args, &config).await,
        Commands::Rebuild(args) => commands::rebuild::run(args, &config).await,
        Commands::Annex(cmd) => commands::annex::run(cmd, &config).await,
        Commands::Search(args) => commands::search::run(args, &config).await
    }
}
