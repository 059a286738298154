//! Agent command handlers
//!
//! Print commands, status and manual triggers against the control API.

use anyhow::Result;
use colored::*;
use spooler_core::dto::agent::AgentStatus;
use spooler_core::dto::command::{PrintCommand, PrintResponse, PrintSettings};

use crate::api::ApiClient;
use crate::config::Config;
use crate::id_resolver::resolve_job_id;
use crate::types::IdOrPrefix;

/// Print a queued job by id
pub async fn print_job(
    config: &Config,
    order_id: &str,
    url: Option<String>,
    printer: Option<String>,
    silent: bool,
) -> Result<()> {
    let job_id = match IdOrPrefix::parse(order_id) {
        IdOrPrefix::Full(uuid) => uuid.to_string(),
        // Without a store the agent gets the raw id and reports it
        prefix if config.has_store() => {
            resolve_job_id(&config.store_client()?, &prefix)
                .await?
                .to_string()
        }
        _ => order_id.to_string(),
    };

    let mut command = PrintCommand::for_job(job_id);
    command.settings = Some(settings(url, printer, silent));
    submit(config, &command).await
}

/// Print an ad-hoc document
pub async fn test_print(
    config: &Config,
    url: String,
    printer: Option<String>,
    silent: bool,
) -> Result<()> {
    let mut command = PrintCommand::test_print(url);
    command.settings = Some(settings(None, printer, silent));
    submit(config, &command).await
}

pub async fn show_status(config: &Config) -> Result<()> {
    let client = ApiClient::new(&config.agent_url);
    let status = client.status().await?;
    print_status(&status);
    Ok(())
}

pub async fn trigger(config: &Config) -> Result<()> {
    let client = ApiClient::new(&config.agent_url);
    client.trigger().await?;
    println!("{} Trigger accepted", "✓".green());
    Ok(())
}

fn settings(url: Option<String>, printer: Option<String>, silent: bool) -> PrintSettings {
    PrintSettings {
        printer_name: printer,
        label_url: url,
        silent: Some(silent),
    }
}

async fn submit(config: &Config, command: &PrintCommand) -> Result<()> {
    let client = ApiClient::new(&config.agent_url);
    let response = client.print(command).await?;
    print_response(&response);

    if !response.success {
        anyhow::bail!("Print command for {} failed", command.order_id);
    }
    Ok(())
}

fn print_response(response: &PrintResponse) {
    if response.success {
        println!("{} {}", "✓".green(), response.message.green());
    } else {
        println!("{} {}", "✗".red(), response.message.red());
        if let Some(error) = &response.error {
            println!("  {}", error.dimmed());
        }
    }
}

fn print_status(status: &AgentStatus) {
    println!("{}", "Agent Status:".bold());
    println!("  Agent ID:   {}", status.agent_id.cyan());
    println!(
        "  Printer:    {}",
        status.printer_name.as_deref().unwrap_or("(system default)")
    );
    println!(
        "  Store:      {}",
        if status.degraded {
            "unavailable".red()
        } else {
            "connected".green()
        }
    );
    println!(
        "  Notifier:   {}",
        if status.notifier_active {
            "active".green()
        } else {
            "polling only".yellow()
        }
    );
    println!(
        "  State:      {}",
        if status.busy {
            "printing".cyan()
        } else {
            "idle".dimmed()
        }
    );
    if status.retry_attempts > 0 {
        println!("  Retries:    {}", status.retry_attempts.to_string().yellow());
    }
    if let Some(error) = &status.last_error {
        println!("  Error:      {}", error.red());
    }
}
