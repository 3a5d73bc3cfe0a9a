//! Quarry CLI
//!
//! Command-line interface for submitting and following scraping jobs.

mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Quarry scraping orchestrator CLI", long_about = None)]
struct Cli {
    /// Orchestrator URL
    #[arg(long, env = "QUARRY_URL", default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        orchestrator_url: cli.url,
    };

    handle_command(cli.command, &config).await
}
