//! nocli-auth - terminal front-end for docker-nocli authentication.
//!
//! Checks whether the management server needs its first admin account, logs
//! in, and keeps the issued token for later runs.

mod app;
mod commands;

use std::io;
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use nocli_auth_core::{AuthSession, Config};

use app::App;
use commands::Command;

/// Log file name inside the data directory
const LOG_FILE: &str = "nocli-auth.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr and, when the data directory is writable, to a file in
/// it. The returned guard must live until exit so the file writer flushes.
/// A failure to create the log directory is handed back for logging.
fn init_tracing(log_dir: &Path) -> (Option<WorkerGuard>, Option<io::Error>) {
    let dir_error = prepare_log_dir(log_dir);

    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(LOG_FILE)
        .build(log_dir)
        .ok();
    let (file_layer, guard) = match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    (guard, dir_error)
}

/// Create the log directory, returning the error instead of dropping it.
fn prepare_log_dir(log_dir: &Path) -> Option<io::Error> {
    std::fs::create_dir_all(log_dir).err()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;

    let (config, config_error) = match Config::load() {
        Ok(c) => (c, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let (_guard, log_dir_error) = init_tracing(&config.data_dir());
    if let Some(e) = log_dir_error {
        warn!(path = %config.data_dir().display(), error = %e, "Failed to create data directory");
    }
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    info!(?command, "nocli-auth starting");

    let mut app = App::new(config)?;

    let session = app.session.clone();
    AuthSession::scope(session, app.run(command)).await
}
