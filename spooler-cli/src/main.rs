//! Spooler CLI
//!
//! Command-line interface for print agents and the shared print queue.

mod api;
mod commands;
mod config;
mod id_resolver;
mod types;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "spooler")]
#[command(about = "Print agent and queue CLI", long_about = None)]
struct Cli {
    /// Control API of the local print agent
    #[arg(
        long,
        global = true,
        env = "SPOOLER_AGENT_URL",
        default_value = "http://127.0.0.1:7311"
    )]
    agent_url: String,

    /// Base URL of the job store API
    #[arg(long, global = true, env = "STORE_URL")]
    store_url: Option<String>,

    /// Service key for the job store API
    #[arg(long, global = true, env = "STORE_KEY", hide_env_values = true)]
    store_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        agent_url: cli.agent_url,
        store_url: cli.store_url,
        store_key: cli.store_key,
    };

    handle_command(cli.command, &config).await
}
