mod cli;
mod commands;
mod config;
mod error;
mod mcp;
mod page_range;
mod pdf;
mod request;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout belongs to command output and the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pagewright=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let limits = cli.limits;

    match cli.command {
        Commands::Mcp => {
            mcp::run_server(limits).await?;
        }
        Commands::Info { path } => {
            commands::info::run(&path, &limits)?;
        }
        Commands::Split {
            path,
            pages,
            output,
        } => {
            commands::split::run(&path, &pages, output, &limits)?;
        }
        Commands::Merge { inputs, output } => {
            commands::merge::run(&inputs, output, &limits)?;
        }
        Commands::ImagesToPdf { inputs, output } => {
            commands::images::run(&inputs, output, &limits)?;
        }
    }

    Ok(())
}
