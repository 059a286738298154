//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod agent;
mod job;

pub use job::JobCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Print a queued job on the agent
    Print {
        /// Job ID (or unambiguous prefix when a store is configured)
        order_id: String,

        /// Document URL, overriding the job's own label URL
        #[arg(long)]
        url: Option<String>,

        /// Printer to use
        #[arg(long)]
        printer: Option<String>,

        /// Skip the interactive render surface
        #[arg(long)]
        silent: bool,
    },
    /// Print an ad-hoc document without touching the queue
    TestPrint {
        /// Document URL
        #[arg(long)]
        url: String,

        /// Printer to use
        #[arg(long)]
        printer: Option<String>,

        /// Skip the interactive render surface
        #[arg(long)]
        silent: bool,
    },
    /// Show agent status
    Status,
    /// Ask the agent to consider the next pending job
    Trigger,
    /// Print queue management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Print {
            order_id,
            url,
            printer,
            silent,
        } => agent::print_job(config, &order_id, url, printer, silent).await,
        Commands::TestPrint {
            url,
            printer,
            silent,
        } => agent::test_print(config, url, printer, silent).await,
        Commands::Status => agent::show_status(config).await,
        Commands::Trigger => agent::trigger(config).await,
        Commands::Job { command } => job::handle_job_command(command, config).await,
    }
}
