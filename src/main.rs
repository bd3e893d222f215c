use anyhow::Context;
use clap::Parser;
use maintenance_server::{
    config::ServerConfig, console, favicon::Favicon, server::Server, server_info::ServerInfo,
};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Answers server list pings and turns away every login.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file. Created with defaults if missing.
    #[arg(short, long, default_value = "maintenance-server.toml")]
    config: PathBuf,
    /// Don't read commands from standard input.
    #[arg(long)]
    no_console: bool,
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
    /// File that receives a copy of the console log. Appended to.
    #[arg(long, default_value = "logs/Log.log")]
    log_file: PathBuf,
}

/// Opens `path` for appending, creating its directory if needed.
fn open_log_file(path: &Path) -> anyhow::Result<fs_err::File> {
    if let Some(parent) = path.parent() {
        fs_err::create_dir_all(parent)?;
    }
    let file = fs_err::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    Ok(file)
}

/// Logs to stdout and to `log_file`.
fn init_logging(filter: EnvFilter, log_file: &Path) -> anyhow::Result<()> {
    let file = open_log_file(log_file)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid log filter")?;
    init_logging(filter, &args.log_file)
        .with_context(|| format!("failed to open log file {}", args.log_file.display()))?;

    let started = Instant::now();

    tracing::info!("Loading configuration from {}", args.config.display());
    let config = ServerConfig::load_or_create(&args.config)?;
    let favicon = Favicon::load(&config.favicon);
    let info = Arc::new(ServerInfo::new(&config, favicon)?);

    tracing::info!(
        "Starting a maintenance server on {}:{}",
        config.ip,
        config.port
    );
    let server = Server::bind(config.bind_address(), info).await?;

    let shutdown = CancellationToken::new();
    if !args.no_console {
        console::spawn(shutdown.clone());
    }
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        }
    });

    tracing::info!(
        "Done ({}ms)! To stop the server, type \"stop\" or \"halt\"",
        started.elapsed().as_millis()
    );
    server.run(shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_log_file_lives_under_logs() {
        let args = Args::parse_from(["maintenance-server"]);
        assert_eq!(args.log_file, Path::new("logs/Log.log"));
    }

    #[test]
    fn log_file_directory_is_created_and_appended_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("Log.log");

        writeln!(open_log_file(&path).unwrap(), "first").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second").unwrap();
        assert_eq!(fs_err::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
