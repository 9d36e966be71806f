//! # Solar Log Server
//!
//! Receives telemetry from an ESP32 solar power monitor over HTTP and stores it
//! as one text file per day.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use solar_log::config::Config;
use solar_log::server::{create_router, AppState};
use solar_log::telemetry::SystemClock;

/// Solar Log Server - daily text logs for the ESP32 solar monitor
#[derive(Parser, Debug)]
#[command(name = "solar-log-server", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(short, long, env = "SOLAR_LOG_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address (overrides config file)
    #[arg(long, env = "SOLAR_LOG_HOST")]
    host: Option<String>,

    /// Bind port (overrides config file)
    #[arg(short, long, env = "SOLAR_LOG_PORT")]
    port: Option<u16>,

    /// Directory for the daily log files (overrides config file)
    #[arg(long, env = "SOLAR_LOG_DIR")]
    log_dir: Option<String>,

    /// Background mode: write operational logs to the server log file
    /// inside the log directory instead of stdout
    #[arg(short, long)]
    background: bool,
}

/// Main entry point for the solar log server
///
/// # Control Flow
///
/// 1. Load configuration (file, then CLI/env overrides)
/// 2. Set up logging to stdout, or to `<log_dir>/server.log` in background mode
/// 3. Open the log directory and build the shared state
/// 4. Serve HTTP until Ctrl+C or SIGTERM
///
/// # Examples
///
/// ```bash
/// solar-log-server --port 4545 --log-dir /var/lib/solar_logs
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Hold the guard so buffered log lines are flushed on exit
    let _log_guard = init_logging(&config, cli.background)?;

    info!("Solar Log Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let log_dir = config.log_dir();
    let state = AppState::new(&log_dir, Arc::new(SystemClock))
        .with_context(|| format!("Failed to open log directory {}", log_dir.display()))?;

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!("Failed to bind {}:{}", config.server.host, config.server.port)
        })?;

    info!("Listening on http://{}", listener.local_addr()?);
    info!("Press Ctrl+C to exit");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

/// Build the effective configuration (CLI > ENV > config file > defaults)
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(host) = &cli.host {
        config.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(log_dir) = &cli.log_dir {
        config.storage.log_dir = log_dir.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. In background mode
/// output goes through a non-blocking writer to the server log file; the
/// returned guard must live as long as the process.
fn init_logging(config: &Config, background: bool) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if !background {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    }

    let appender = server_log_appender(config)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

/// Open `<log_dir>/<server_log>` for appending, creating the directory if needed
fn server_log_appender(config: &Config) -> Result<RollingFileAppender> {
    let log_dir = config.log_dir();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&config.logging.server_log)
        .build(&log_dir)
        .with_context(|| {
            format!(
                "Failed to open server log {}",
                log_dir.join(&config.logging.server_log).display()
            )
        })
}

/// Resolve on Ctrl+C or, on unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received terminate signal, shutting down..."),
    }
}
