//! Console and file logging
//!
//! Console output goes to stderr at INFO by default. An optional log file
//! receives everything down to DEBUG, including the command lines and
//! captured output of every external tool. Timestamps are seconds since
//! start-up.

use std::io;
use std::path::{Path, PathBuf};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, time::Uptime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::error::{BtrarchError, BtrarchResult};

/// Logging settings derived from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Most verbose level shown on the console
    pub console_level: Level,
    /// Additional log file receiving debug output
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Console level for the `--debug` / `--quiet` flags; quiet wins
    pub fn from_flags(debug: bool, quiet: bool, file: Option<PathBuf>) -> Self {
        let console_level = if quiet {
            Level::WARN
        } else if debug {
            Level::DEBUG
        } else {
            Level::INFO
        };

        Self {
            console_level,
            file,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::from_flags(false, false, None)
    }
}

/// Guard that must be held to keep the file writer running
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Initialize logging with the given configuration
///
/// `RUST_LOG` overrides the console level. Returns a guard that must be
/// held for the lifetime of the application so the log file is flushed.
pub fn init_logging(config: &LoggingConfig) -> BtrarchResult<LogGuard> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            EnvFilter::default().add_directive(LevelFilter::from_level(config.console_level).into())
        });

    let console_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(Uptime::default())
        .with_target(false)
        .with_filter(console_filter);

    let (file_layer, guard) = match &config.file {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(Uptime::default())
                .with_ansi(false)
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| BtrarchError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(LogGuard { _guard: guard })
}

/// Split a log file path into the directory and file name
fn split_log_path(path: &Path) -> BtrarchResult<(PathBuf, PathBuf)> {
    let name = path
        .file_name()
        .ok_or_else(|| BtrarchError::Config(format!("Invalid log file: {}", path.display())))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, PathBuf::from(name)))
}
