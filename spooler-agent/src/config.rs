//! Agent configuration
//!
//! Defines all configurable parameters for the agent including the job
//! store connection, printer defaults, retry timing and the control API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Which job store backend a store URL selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// `postgres://` or `postgresql://`
    Postgres,
    /// `http://` or `https://`, a PostgREST-compatible API
    Rest,
    /// `memory://`, an in-process table
    Memory,
}

/// Agent configuration
///
/// Store credentials and identity are read as opaque strings; the agent
/// only checks what it needs to start.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base agent identifier; the persisted suffix is appended to it
    pub agent_id: String,

    /// Printer used when neither the job nor the command names one
    pub printer_name: Option<String>,

    /// Job store location (postgres://, https://, memory://)
    ///
    /// `None` runs the agent without a store, in degraded mode.
    pub store_url: Option<String>,

    /// Service key for REST stores
    pub store_key: Option<String>,

    /// Directory holding the persisted agent id suffix
    pub state_dir: PathBuf,

    /// How often to poll the store regardless of notifications
    pub poll_interval: Duration,

    /// Delay before retrying a failed print
    pub retry_delay: Duration,

    /// Ceiling on print attempts per claimed job
    pub max_retries: u32,

    /// Timeout for downloading a label
    pub fetch_timeout: Duration,

    /// Timeout for the render-complete signal of interactive prints
    pub render_timeout: Duration,

    /// Program used for silent printing (CUPS `lp` compatible)
    pub print_command: String,

    /// Renderer used for interactive printing, with its arguments
    pub renderer_command: Option<String>,

    /// Address of the local control API
    pub control_bind_addr: String,

    /// Install the table, indexes and notify trigger on startup (Postgres only)
    pub run_migrations: bool,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(agent_id: String) -> Self {
        Self {
            agent_id,
            printer_name: None,
            store_url: None,
            store_key: None,
            state_dir: default_state_dir(),
            poll_interval: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
            max_retries: 3,
            fetch_timeout: Duration::from_secs(30),
            render_timeout: Duration::from_secs(30),
            print_command: "lp".to_string(),
            renderer_command: None,
            control_bind_addr: "127.0.0.1:7311".to_string(),
            run_migrations: false,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - AGENT_ID (optional, default: agent-unknown)
    /// - PRINTER_NAME (optional)
    /// - STORE_URL or SUPABASE_URL (optional, degraded mode without it)
    /// - STORE_KEY or SUPABASE_SERVICE_ROLE_KEY (required for REST stores)
    /// - AGENT_STATE_DIR (optional, default: platform data directory)
    /// - POLL_INTERVAL (optional, seconds, default: 30)
    /// - RETRY_DELAY (optional, seconds, default: 5)
    /// - MAX_RETRIES (optional, default: 3)
    /// - FETCH_TIMEOUT (optional, seconds, default: 30)
    /// - RENDER_TIMEOUT (optional, seconds, default: 30)
    /// - PRINT_COMMAND (optional, default: lp)
    /// - RENDERER_COMMAND (optional)
    /// - CONTROL_BIND_ADDR (optional, default: 127.0.0.1:7311)
    /// - RUN_MIGRATIONS (optional, default: false)
    pub fn from_env() -> anyhow::Result<Self> {
        let agent_id = env_string("AGENT_ID").unwrap_or_else(|| "agent-unknown".to_string());

        let mut config = Self::new(agent_id);

        config.store_url = env_string("STORE_URL").or_else(|| env_string("SUPABASE_URL"));

        config.printer_name = env_string("PRINTER_NAME");
        config.store_key =
            env_string("STORE_KEY").or_else(|| env_string("SUPABASE_SERVICE_ROLE_KEY"));

        if let Some(dir) = env_string("AGENT_STATE_DIR") {
            config.state_dir = PathBuf::from(dir);
        }

        if let Some(interval) = env_secs("POLL_INTERVAL") {
            config.poll_interval = interval;
        }

        if let Some(delay) = env_secs("RETRY_DELAY") {
            config.retry_delay = delay;
        }

        if let Some(max) = env_string("MAX_RETRIES").and_then(|s| s.parse::<u32>().ok()) {
            config.max_retries = max;
        }

        if let Some(timeout) = env_secs("FETCH_TIMEOUT") {
            config.fetch_timeout = timeout;
        }

        if let Some(timeout) = env_secs("RENDER_TIMEOUT") {
            config.render_timeout = timeout;
        }

        if let Some(command) = env_string("PRINT_COMMAND") {
            config.print_command = command;
        }

        config.renderer_command = env_string("RENDERER_COMMAND");

        if let Some(addr) = env_string("CONTROL_BIND_ADDR") {
            config.control_bind_addr = addr;
        }

        config.run_migrations = env_string("RUN_MIGRATIONS")
            .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(config)
    }

    /// Sets the default printer
    pub fn with_printer(mut self, printer_name: impl Into<String>) -> Self {
        self.printer_name = Some(printer_name.into());
        self
    }

    /// Sets the job store location
    pub fn with_store(mut self, store_url: impl Into<String>) -> Self {
        self.store_url = Some(store_url.into());
        self
    }

    /// The configured store URL
    pub fn require_store_url(&self) -> anyhow::Result<&str> {
        self.store_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("no job store configured (STORE_URL not set)"))
    }

    /// Backend selected by the store URL scheme
    pub fn store_kind(&self) -> anyhow::Result<StoreKind> {
        let scheme = self
            .require_store_url()?
            .split_once("://")
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| anyhow::anyhow!("store_url must include a scheme"))?;

        match scheme.as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "http" | "https" => Ok(StoreKind::Rest),
            "memory" => Ok(StoreKind::Memory),
            other => anyhow::bail!("unsupported store_url scheme: {}", other),
        }
    }

    /// Parsed control API address
    pub fn control_addr(&self) -> anyhow::Result<SocketAddr> {
        self.control_bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid control_bind_addr: {}", e))
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.agent_id.is_empty() {
            anyhow::bail!("agent_id cannot be empty");
        }

        if self.store_url.is_some()
            && self.store_kind()? == StoreKind::Rest
            && self.store_key.as_deref().is_none_or(str::is_empty)
        {
            anyhow::bail!("store_key is required for REST stores");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.max_retries == 0 {
            anyhow::bail!("max_retries must be greater than 0");
        }

        if self.fetch_timeout.is_zero() || self.render_timeout.is_zero() {
            anyhow::bail!("timeouts must be greater than 0");
        }

        if self.print_command.trim().is_empty() {
            anyhow::bail!("print_command cannot be empty");
        }

        self.control_addr()?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("agent-unknown".to_string())
    }
}

/// Platform data directory for the agent, or the working directory
fn default_state_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "spooler")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_string(key)
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}
