//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod bench;
mod catalog;
mod job;

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use quarry_core::domain::variant::Variant;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Submit a scraping job
    Submit {
        /// Blog category to scrape
        #[arg(short, long)]
        category: String,

        /// Strategy variant (sequential, bounded, concurrent)
        #[arg(short, long, default_value_t = Variant::default())]
        variant: Variant,

        /// URL to notify once results are exported
        #[arg(long)]
        webhook: Option<String>,

        /// Contact address included in the notification
        #[arg(long)]
        email: Option<String>,

        /// Wait for the job to finish and show the result
        #[arg(short, long)]
        wait: bool,
    },
    /// Show one job
    Status {
        /// Job ID or unambiguous prefix
        id: String,

        /// Print the records as JSON
        #[arg(long)]
        records: bool,
    },
    /// Show pending, processing and finished jobs
    Queue,
    /// List the strategy variants
    Variants,
    /// List the valid categories
    Categories,
    /// Run every variant against every category and compare them
    Bench {
        /// Variants to compare (comma-separated)
        #[arg(long, value_delimiter = ',', default_values_t = Variant::ALL)]
        variants: Vec<Variant>,

        /// Categories to scrape (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        categories: Vec<String>,

        #[arg(long)]
        webhook: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Seconds to wait for each job
        #[arg(long, default_value = "600")]
        timeout: u64,

        /// Write the comparison rows to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        Commands::Submit {
            category,
            variant,
            webhook,
            email,
            wait,
        } => job::submit(&client, category, variant, webhook, email, wait).await,
        Commands::Status { id, records } => job::status(&client, &id, records).await,
        Commands::Queue => job::queue(&client).await,
        Commands::Variants => catalog::variants(&client).await,
        Commands::Categories => catalog::categories(&client).await,
        Commands::Bench {
            variants,
            categories,
            webhook,
            email,
            timeout,
            output,
        } => {
            let plan = bench::BenchPlan {
                variants,
                categories,
                webhook,
                email,
                timeout: std::time::Duration::from_secs(timeout),
            };
            bench::run(&client, plan, output.as_deref()).await
        }
    }
}
