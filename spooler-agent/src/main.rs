//! Spooler Agent
//!
//! Watches the shared print queue, claims jobs and prints them locally.
//!
//! Startup:
//! - Load configuration and resolve the durable agent id
//! - Connect to the job store with bounded retries (degraded mode on failure)
//! - Start the notifier pump, the poll loop and an initial trigger
//! - Serve the control API until SIGINT/SIGTERM

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spooler_agent::api;
use spooler_agent::config::Config;
use spooler_agent::identity::{resolve_unique_agent_id, validate_agent_id};
use spooler_agent::notifier::spawn_notifier_pump;
use spooler_agent::repository::connect_with_retry;
use spooler_agent::scheduler::{JobRunner, RetryPolicy, spawn_poll_loop};
use spooler_agent::service::{
    ArtifactFetcher, ExecutionService, ExecutorSettings, PrintExecutor, Printer,
    ProcessSurfaceFactory, SurfaceFactory, SystemPrinter,
};
use spooler_agent::shutdown::install_shutdown_handler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spooler_agent=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Spooler Agent");

    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: agent_id={}, store_url={}, printer={:?}",
        config.agent_id,
        config.store_url.as_deref().unwrap_or("(none)"),
        config.printer_name
    );

    if let Err(e) = validate_agent_id(&config.agent_id) {
        warn!("Agent ID '{}' looks invalid: {}", config.agent_id, e);
    }

    let agent_id = resolve_unique_agent_id(&config.agent_id, &config.state_dir);
    info!("Claiming jobs as {}", agent_id);

    let token = install_shutdown_handler().context("Failed to install signal handlers")?;

    // Connect to the job store (with retry logic)
    let backend = if config.store_url.is_none() {
        error!("STORE_URL not set, running degraded");
        None
    } else {
        match connect_with_retry(&config, RetryPolicy::store_init()).await {
            Ok(backend) => Some(backend),
            Err(e) => {
                error!("Job store unavailable, running degraded: {:#}", e);
                None
            }
        }
    };

    let executor = build_executor(&config)?;

    let runner = JobRunner::new(
        agent_id,
        backend.as_ref().map(|b| Arc::clone(&b.jobs)),
        executor,
    )
    .with_retry_policy(RetryPolicy::new(config.max_retries, config.retry_delay))
    .with_printer_name(config.printer_name.clone());
    let runner = Arc::new(runner);

    if backend.is_none() {
        runner.set_error("Database connection not available");
    }

    info!("Services initialized");

    let mut tasks = Vec::new();

    if let Some(backend) = &backend {
        match &backend.notifier {
            Some(notifier) => tasks.push(spawn_notifier_pump(
                Arc::clone(notifier),
                Arc::clone(&runner),
                RetryPolicy::store_init(),
                token.clone(),
            )),
            None => info!("Job store has no push channel, relying on polling"),
        }

        tasks.push(spawn_poll_loop(
            Arc::clone(&runner),
            config.poll_interval,
            token.clone(),
        ));

        runner.trigger();
    }

    // Serve the control API until shutdown
    let addr = config.control_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind control API to {}", addr))?;
    info!("Control API listening on {}", addr);

    let app = api::create_router(Arc::clone(&runner));
    let shutdown = token.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("Control API failed")?;

    // Stop background tasks; an in-flight print finishes on its own
    token.cancel();
    runner.cancel_retry();
    for task in tasks {
        if let Err(e) = task.await {
            warn!("Background task panicked: {}", e);
        }
    }

    info!("Spooler Agent stopped");
    Ok(())
}

/// Loads and validates configuration from environment variables
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Builds the print executor described by the configuration
fn build_executor(config: &Config) -> Result<Arc<dyn ExecutionService>> {
    let fetcher =
        ArtifactFetcher::new(config.fetch_timeout).context("Failed to build HTTP client")?;
    let printer: Arc<dyn Printer> = Arc::new(SystemPrinter::new(config.print_command.clone()));

    let surfaces = config.renderer_command.as_deref().and_then(|command| {
        ProcessSurfaceFactory::from_command_line(command, Arc::clone(&printer))
            .map(|factory| Arc::new(factory) as Arc<dyn SurfaceFactory>)
    });
    if surfaces.is_none() {
        info!("No renderer configured, interactive prints are unavailable");
    }

    let settings = ExecutorSettings {
        default_printer: config.printer_name.clone(),
        render_timeout: config.render_timeout,
        ..Default::default()
    };

    Ok(Arc::new(PrintExecutor::new(fetcher, printer, surfaces, settings)))
}
