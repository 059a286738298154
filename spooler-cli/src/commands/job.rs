//! Job command handlers
//!
//! Inspects and edits the shared print queue through the store API.

use anyhow::{Result, anyhow};
use clap::Subcommand;
use colored::*;
use spooler_client::StoreClient;
use spooler_core::domain::job::{Job, JobStatus, PrintOverrides};
use spooler_core::dto::job::NewJob;

use crate::config::Config;
use crate::id_resolver::resolve_job_id;
use crate::types::IdOrPrefix;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List the most recent jobs
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// List claimable jobs, oldest first
    Pending {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Get job details
    Get {
        /// Job ID or unambiguous prefix
        id: String,

        /// Print the raw row as JSON
        #[arg(long)]
        json: bool,
    },
    /// Insert a new pending job
    Enqueue {
        /// External order reference
        order_id: String,

        /// Document URL
        #[arg(long)]
        url: String,

        #[arg(long)]
        printer: Option<String>,

        #[arg(long)]
        copies: Option<i32>,

        #[arg(long)]
        paper_size: Option<String>,

        /// portrait or landscape
        #[arg(long)]
        orientation: Option<String>,
    },
    /// Overwrite the status of a job
    SetStatus {
        /// Job ID or unambiguous prefix
        id: String,

        /// pending, printing, completed or failed
        #[arg(value_parser = parse_status)]
        status: JobStatus,
    },
}

fn parse_status(value: &str) -> Result<JobStatus, String> {
    value.parse()
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.store_client()?;

    match command {
        JobCommands::List { limit } => list_jobs(&client, limit).await,
        JobCommands::Pending { limit } => list_pending(&client, limit).await,
        JobCommands::Get { id, json } => get_job(&client, &id, json).await,
        JobCommands::Enqueue {
            order_id,
            url,
            printer,
            copies,
            paper_size,
            orientation,
        } => {
            let job = NewJob {
                order_id,
                label_url: url,
                printer_name: printer,
                copies,
                paper_size,
                orientation,
            };
            enqueue(&client, &job).await
        }
        JobCommands::SetStatus { id, status } => set_status(&client, &id, status).await,
    }
}

async fn list_jobs(client: &StoreClient, limit: usize) -> Result<()> {
    let jobs = client.list_jobs(limit).await?;

    if jobs.is_empty() {
        println!("{}", "No jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

async fn list_pending(client: &StoreClient, limit: usize) -> Result<()> {
    let jobs = client.list_pending_jobs(limit).await?;

    if jobs.is_empty() {
        println!("{}", "Queue is empty.".yellow());
    } else {
        println!("{}", format!("{} pending job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

async fn get_job(client: &StoreClient, id: &str, json: bool) -> Result<()> {
    let uuid = resolve_job_id(client, &IdOrPrefix::parse(id)).await?;
    let job = client.get_job(uuid).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        print_job_details(&job);
    }

    Ok(())
}

async fn enqueue(client: &StoreClient, job: &NewJob) -> Result<()> {
    if job.order_id.trim().is_empty() {
        return Err(anyhow!("Order ID must not be empty"));
    }

    let created = client.enqueue_job(job).await?;
    println!(
        "{} Enqueued job {} for order {}",
        "✓".green(),
        created.id.to_string().cyan(),
        created.order_id
    );
    Ok(())
}

async fn set_status(client: &StoreClient, id: &str, status: JobStatus) -> Result<()> {
    let uuid = resolve_job_id(client, &IdOrPrefix::parse(id)).await?;
    client.update_job_status(uuid, status).await?;
    println!("{} Job {} is now {}", "✓".green(), uuid, colorize_status(&status));
    Ok(())
}

fn print_job_summary(job: &Job) {
    println!("  {} Job {}", "▸".cyan(), job.id.to_string().dimmed());
    println!("    Order:    {}", job.order_id);
    println!("    Status:   {}", colorize_status(&job.status));
    println!(
        "    Created:  {}",
        job.created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    if let Some(agent) = &job.claimed_by {
        println!("    Agent:    {}", agent.dimmed());
    }
    println!();
}

fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.id.to_string().cyan());
    println!("  Order:       {}", job.order_id);
    println!("  Status:      {}", colorize_status(&job.status));
    println!("  Label URL:   {}", job.label_url.dimmed());
    println!("  Created:     {}", job.created_at.format("%Y-%m-%d %H:%M:%S"));

    if let Some(agent) = &job.claimed_by {
        println!("  Claimed by:  {}", agent);
    }
    if let Some(claimed) = job.claimed_at {
        println!("  Claimed:     {}", claimed.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(printed) = job.printed_at {
        println!("  Printed:     {}", printed.format("%Y-%m-%d %H:%M:%S"));

        if let Some(claimed) = job.claimed_at {
            let seconds = printed.signed_duration_since(claimed).num_seconds();
            println!("  Duration:    {}s", seconds);
        }
    }

    let overrides = job.overrides();
    if overrides != PrintOverrides::default() {
        println!("\n{}", "Overrides:".bold());
        if let Some(printer) = &overrides.printer_name {
            println!("  {} = {}", "printer".cyan(), printer);
        }
        if let Some(copies) = overrides.copies {
            println!("  {} = {}", "copies".cyan(), copies);
        }
        if let Some(paper) = &overrides.paper_size {
            println!("  {} = {}", "paper_size".cyan(), paper);
        }
        if let Some(orientation) = &overrides.orientation {
            println!("  {} = {}", "orientation".cyan(), orientation);
        }
    }
}

fn colorize_status(status: &JobStatus) -> colored::ColoredString {
    let label = status.as_str();
    match status {
        JobStatus::Pending => label.yellow(),
        JobStatus::Printing => label.cyan(),
        JobStatus::Completed => label.green(),
        JobStatus::Failed => label.red(),
    }
}
