//! Stakelink Bridge Server
//!
//! Receives uplink events from the network server, answers time-sync requests,
//! forwards alarms and heartbeats, and exposes the light control API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use stakelink_bridge::{
    build_router, serve, AppState, BridgeSettings, ChirpStackQueue, StatusServerClient,
};
use tokio::net::TcpListener;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "stakelink-server")]
#[command(about = "Induction-light bridge for a LoRaWAN network server")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, env = "STAKELINK_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address (overrides the config file)
    #[arg(short, long, env = "STAKELINK_LISTEN")]
    listen: Option<String>,

    /// Log level filter, e.g. "info" or "stakelink_bridge=debug"
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Also append logs to this file (overrides the config file)
    #[arg(long, env = "STAKELINK_LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Split a log file path into the directory and file name the appender wants
fn log_file_parts(path: &Path) -> Result<(PathBuf, PathBuf)> {
    let name = path
        .file_name()
        .with_context(|| format!("log file path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, PathBuf::from(name)))
}

/// Install the global subscriber; the returned guard flushes the log file on drop
fn init_logging(cli: &Cli, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let console = if cli.json_logs {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer().with_writer(std::io::stderr).boxed()
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (dir, name) = log_file_parts(path)?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .init();
    Ok(guard)
}

fn load_settings(path: Option<&Path>) -> Result<BridgeSettings> {
    let Some(path) = path else {
        return Ok(BridgeSettings::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let settings = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(settings)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down...");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(listen) = cli.listen.clone() {
        settings.listen = listen;
    }
    if let Some(file) = cli.log_file.clone() {
        settings.logging.file = Some(file);
    }
    settings.validate().context("invalid configuration")?;

    let _log_guard = init_logging(&cli, settings.logging.file.as_deref())?;

    info!("Starting stakelink bridge v{}", env!("CARGO_PKG_VERSION"));
    match &cli.config {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file given, using defaults"),
    }
    if let Some(file) = &settings.logging.file {
        info!("Logging to {}", file.display());
    }
    info!("Network server: {}", settings.chirpstack.url);
    info!("Status server: {}", settings.status_server.url);
    info!(
        "{} multicast group(s), reference offset UTC{:+}",
        settings.multicast_groups.len(),
        settings.time_sync.utc_offset_hours
    );

    let queue = Arc::new(ChirpStackQueue::new(&settings.chirpstack)?);
    let status = Arc::new(StatusServerClient::new(
        &settings.status_server,
        settings.time_offset()?,
    )?);
    let state = AppState::from_settings(&settings, queue, status)?;
    let router = build_router(Arc::new(state), settings.http.cors_enabled);

    let listener = TcpListener::bind(&settings.listen)
        .await
        .with_context(|| format!("failed to bind {}", settings.listen))?;
    serve(listener, router, shutdown_signal()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_parts() {
        let (dir, name) = log_file_parts(Path::new("/var/log/stakelink/bridge.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log/stakelink"));
        assert_eq!(name, PathBuf::from("bridge.log"));

        let (dir, name) = log_file_parts(Path::new("log.txt")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("log.txt"));

        assert!(log_file_parts(Path::new("..")).is_err());
    }

    #[test]
    fn test_cli_log_file_flag() {
        let cli = Cli::parse_from(["stakelink-server", "--log-file", "logs/bridge.log"]);
        assert_eq!(cli.log_file, Some(PathBuf::from("logs/bridge.log")));
        assert!(!cli.json_logs);
    }
}
