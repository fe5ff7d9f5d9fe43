//! # Projection CLI Binary
//!
//! Command-line interface for building and inspecting projections.

use anyhow::Result;
use clap::Parser;
use projection_engine::cli::{Cli, CliHandler};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Create CLI handler
    let handler = CliHandler::new(&cli)?;

    // Handle command
    handler.handle_command(cli.command).await?;

    Ok(())
}
