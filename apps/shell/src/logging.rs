//! Tracing setup for the shell
//!
//! - Console: compact, colored, on stderr so `--json` output stays clean
//! - File: daily rotation under the log directory, when one is enabled

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_PREFIX: &str = "panelbus";

/// `~/.local/share/panelbus/logs` on Linux, `%LOCALAPPDATA%\panelbus\logs` on Windows
pub fn default_logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("panelbus")
        .join("logs")
}

fn default_filter() -> anyhow::Result<EnvFilter> {
    // Crate names use underscores in targets (panelbus-core -> panelbus_core)
    Ok(EnvFilter::new("info")
        .add_directive("panelbus_core=debug".parse()?)
        .add_directive("panelbus_admin=debug".parse()?)
        .add_directive("panelbus_shell=debug".parse()?))
}

fn file_writer(logs_dir: &Path) -> anyhow::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(logs_dir)?;
    // panelbus.2026-01-22.log
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(logs_dir)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer and must live until exit.
pub fn init(logs_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    dotenvy::dotenv().ok();

    // RUST_LOG takes precedence
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => default_filter()?,
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .compact()
        .with_line_number(false)
        .with_file(false)
        .with_target(true);

    let (file_layer, guard) = match logs_dir {
        Some(dir) => match file_writer(dir) {
            Ok((writer, guard)) => {
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_target(true);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!("Warning: file logging disabled ({}): {e:#}", dir.display());
                (None, None)
            }
        },
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
