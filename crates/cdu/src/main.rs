// # cdu - Cloudflare DNS Updater
//
// This binary is a THIN integration layer:
// - Parse the command line and read configuration from the environment
// - Initialize logging and the tokio runtime
// - Wire the HTTP IP resolver and the Cloudflare API into the core
// - Run one update cycle (`update`) or the daemon loop (`daemon`)
//
// All update logic lives in cdu-core.
//
// ## Commands
//
// ```bash
// # One-shot: point the given records at the current public IP
// API_TOKEN=your_token cdu update example.com home.example.com '*.example.com'
//
// # Daemon: repeat every POLL_INTERVAL_SECONDS until SIGTERM/SIGINT
// export API_TOKEN=your_token
// export ZONE_NAME=example.com
// export RECORD_NAMES=home.example.com,*.example.com
// export POLL_INTERVAL_SECONDS=300
// cdu daemon
// ```
//
// ## Configuration
//
// - `API_TOKEN`: Cloudflare API token (required)
// - `ZONE_NAME`: Zone name (daemon)
// - `RECORD_NAMES`: Comma-separated list of records (daemon)
// - `POLL_INTERVAL_SECONDS`: Seconds between cycles (daemon, default 60)
// - `IP_LOOKUP_PRIMARY_URL` / `IP_LOOKUP_SECONDARY_URL`: IP lookup endpoints
// - `IP_LOOKUP_TIMEOUT_SECONDS`: IP lookup timeout (default 5)
// - `LOG_LEVEL`: trace, debug, info, warn, error (default info)

use anyhow::{Context, Result};
use cdu_core::{
    Credentials, Daemon, DaemonConfig, DaemonEvent, IpLookupConfig, RecordUpdater,
    parse_record_names,
};
use cdu_ip_http::HttpIpResolver;
use cdu_provider_cloudflare::CloudflareApi;
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown or completed update
/// - 1: Configuration or usage error
/// - 2: Runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CduExitCode {
    /// Clean shutdown (normal exit)
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (failed update, unexpected failure)
    RuntimeError = 2,
}

impl From<CduExitCode> for ExitCode {
    fn from(code: CduExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep Cloudflare DNS records pointed at this host's public IP
#[derive(Debug, Parser)]
#[command(name = "cdu", version, about)]
struct Cli {
    /// Log at debug level
    #[arg(long, global = true)]
    debug: bool,

    /// Look everything up but do not modify any record
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Update the given records once and exit
    Update {
        /// Cloudflare API token
        #[arg(long, env = "API_TOKEN", hide_env_values = true)]
        token: String,

        /// Zone the records belong to (e.g. example.com)
        zone: String,

        /// Record names to update (e.g. home.example.com '*.example.com')
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },

    /// Update the records from the environment on a fixed interval
    Daemon,
}

/// Everything one invocation needs, resolved from the command line and
/// environment variables
#[derive(Debug)]
struct Settings {
    credentials: Credentials,
    daemon: DaemonConfig,
    ip_lookup: IpLookupConfig,
}

/// Read a variable from the process environment
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl Settings {
    /// Settings for `cdu update`: records and zone from the command line
    fn for_update(
        token: String,
        zone: &str,
        names: Vec<String>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let records = normalize_record_names(names);
        if records.is_empty() {
            anyhow::bail!("At least one non-blank record name is required");
        }

        let settings = Self {
            credentials: Credentials::new(token, zone.trim()),
            daemon: DaemonConfig::new(records),
            ip_lookup: ip_lookup_from_vars(&var)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Settings for `cdu daemon`: everything from environment variables
    fn for_daemon(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_token = var("API_TOKEN").context("API_TOKEN is required")?;
        let zone = var("ZONE_NAME").context("ZONE_NAME is required")?;
        let records = parse_record_names(&var("RECORD_NAMES").unwrap_or_default());
        if records.is_empty() {
            anyhow::bail!(
                "RECORD_NAMES must contain at least one record. \
                Set it via: export RECORD_NAMES=home.example.com,*.example.com"
            );
        }

        let mut daemon = DaemonConfig::new(records);
        if let Some(raw) = var("POLL_INTERVAL_SECONDS") {
            daemon = daemon.with_interval_secs(parse_secs("POLL_INTERVAL_SECONDS", &raw)?);
        }

        let settings = Self {
            credentials: Credentials::new(api_token, zone.trim()),
            daemon,
            ip_lookup: ip_lookup_from_vars(&var)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        self.credentials.validate()?;
        self.daemon.validate()?;
        self.ip_lookup.validate()?;
        Ok(())
    }
}

/// IP lookup endpoints and timeout, defaults overridden by the environment
fn ip_lookup_from_vars(var: &impl Fn(&str) -> Option<String>) -> Result<IpLookupConfig> {
    let mut ip_lookup = IpLookupConfig::default();
    if let Some(url) = var("IP_LOOKUP_PRIMARY_URL") {
        ip_lookup.primary_url = url;
    }
    if let Some(url) = var("IP_LOOKUP_SECONDARY_URL") {
        ip_lookup.secondary_url = url;
    }
    if let Some(raw) = var("IP_LOOKUP_TIMEOUT_SECONDS") {
        ip_lookup.timeout_secs = parse_secs("IP_LOOKUP_TIMEOUT_SECONDS", &raw)?;
    }
    Ok(ip_lookup)
}

/// Trim record names given on the command line and drop blank ones
fn normalize_record_names(names: Vec<String>) -> Vec<String> {
    names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .with_context(|| format!("{} must be a whole number of seconds. Got: {}", key, raw))
}

/// Map a `LOG_LEVEL` value onto a tracing level
fn parse_log_level(raw: &str) -> Option<Level> {
    match raw.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too, on stdout
            let code = if e.use_stderr() {
                CduExitCode::ConfigError
            } else {
                CduExitCode::Success
            };
            let _ = e.print();
            return code.into();
        }
    };

    // Initialize tracing
    let log_level = if cli.debug {
        Level::DEBUG
    } else {
        match std::env::var("LOG_LEVEL") {
            Ok(raw) => match parse_log_level(&raw) {
                Some(level) => level,
                None => {
                    eprintln!(
                        "LOG_LEVEL '{}' is not valid. \
                        Valid levels: trace, debug, info, warn, error",
                        raw
                    );
                    return CduExitCode::ConfigError.into();
                }
            },
            Err(_) => Level::INFO,
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CduExitCode::ConfigError.into();
    }

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CduExitCode::RuntimeError.into();
        }
    };

    let dry_run = cli.dry_run;
    let code = match cli.command {
        Command::Update { token, zone, names } => {
            match Settings::for_update(token, &zone, names, env_var) {
                Ok(settings) => rt.block_on(run_update(settings, dry_run)),
                Err(e) => {
                    error!("Configuration error: {:#}", e);
                    CduExitCode::ConfigError
                }
            }
        }
        Command::Daemon => match Settings::for_daemon(env_var) {
            Ok(settings) => rt.block_on(run_daemon(settings, dry_run)),
            Err(e) => {
                error!("Configuration error: {:#}", e);
                CduExitCode::ConfigError
            }
        },
    };

    code.into()
}

/// Build the daemon from its collaborators
fn build_daemon(
    credentials: Credentials,
    config: DaemonConfig,
    ip_lookup: &IpLookupConfig,
    dry_run: bool,
) -> Result<(Daemon, mpsc::Receiver<DaemonEvent>)> {
    credentials.validate()?;

    let resolver = HttpIpResolver::new(ip_lookup)?;
    let api = CloudflareApi::new()?.with_dry_run(dry_run);
    if dry_run {
        info!("Dry-run mode: records will not be modified");
    }

    let updater = RecordUpdater::new(Arc::new(api), credentials);
    Ok(Daemon::new(Box::new(resolver), updater, config)?)
}

/// Drain daemon events so the channel never fills up
fn spawn_event_drain(mut events: mpsc::Receiver<DaemonEvent>) {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            tracing::trace!("event: {:?}", event);
        }
    });
}

/// Run a single update cycle
async fn run_update(settings: Settings, dry_run: bool) -> CduExitCode {
    let (daemon, events) = match build_daemon(
        settings.credentials,
        settings.daemon,
        &settings.ip_lookup,
        dry_run,
    ) {
        Ok(built) => built,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return CduExitCode::ConfigError;
        }
    };
    spawn_event_drain(events);

    match daemon.run_once().await {
        Ok(_) => CduExitCode::Success,
        // The cycle failure has already been logged by the daemon
        Err(_) => CduExitCode::RuntimeError,
    }
}

/// Run the daemon loop until a shutdown signal arrives
async fn run_daemon(settings: Settings, dry_run: bool) -> CduExitCode {
    info!(
        "Configuration loaded: {} record(s) in zone {}, every {}s",
        settings.daemon.records.len(),
        settings.credentials.zone,
        settings.daemon.interval_secs
    );

    let (daemon, events) = match build_daemon(
        settings.credentials,
        settings.daemon,
        &settings.ip_lookup,
        dry_run,
    ) {
        Ok(built) => built,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return CduExitCode::ConfigError;
        }
    };
    spawn_event_drain(events);

    match daemon.run().await {
        Ok(()) => {
            info!("Shutting down");
            CduExitCode::Success
        }
        Err(e) if e.is_fatal() => CduExitCode::ConfigError,
        Err(e) => {
            error!("Daemon error: {}", e);
            CduExitCode::RuntimeError
        }
    }
}
