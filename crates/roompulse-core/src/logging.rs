//! Structured logging for roompulse
//!
//! This module provides the logging infrastructure using `tracing` with
//! configurable output formats and destinations.
//!
//! # Features
//!
//! - **Pretty format**: Human-friendly colored output for interactive use
//! - **JSON format**: Machine-parseable JSON lines for CI and log shipping
//! - **File output**: Optional log file alongside stderr
//!
//! # Usage
//!
//! Initialize logging once at startup:
//!
//! ```ignore
//! use roompulse_core::logging::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! ```
//!
//! # Correlation Fields
//!
//! Use these field names consistently in spans and events:
//! - `room_id`: Room identifier
//! - `participant`: Participant identity
//! - `timestamp_ms`: Sample time of a recorded snapshot

pub use crate::config::LogFormat;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level filter (trace, debug, info, warn, error)
    /// Can be overridden by RUST_LOG environment variable
    pub level: String,

    /// Output format (pretty or json)
    pub format: LogFormat,

    /// Optional path to log file
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

/// Error type for logging initialization
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("failed to create log file: {0}")]
    FileCreate(#[from] io::Error),

    /// Also returned when a global subscriber is already installed.
    #[error("failed to set global subscriber: {0}")]
    SetSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Open `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new().create(true).append(true).open(path)
}

/// Build the level filter, honoring `RUST_LOG` when it is set.
fn build_filter(level: &str) -> Result<EnvFilter, LogError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|_| LogError::InvalidLevel(level.to_string()))
}

/// Install the global logging subscriber.
///
/// Logs always go to stderr; `config.file` adds an uncolored copy in the
/// same format. The `RUST_LOG` environment variable overrides the
/// configured level, e.g. `RUST_LOG=roompulse_core=debug`.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let env_filter = build_filter(&config.level)?;
    let log_file = config
        .file
        .as_deref()
        .map(open_log_file)
        .transpose()?
        .map(Mutex::new);

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format {
        LogFormat::Pretty => {
            let file_layer = log_file.map(|file| {
                fmt::layer()
                    .with_writer(file)
                    .with_target(true)
                    .with_ansi(false)
            });
            tracing::subscriber::set_global_default(
                registry
                    .with(
                        fmt::layer()
                            .with_writer(io::stderr)
                            .with_target(true)
                            .with_ansi(true),
                    )
                    .with(file_layer),
            )?;
        }
        LogFormat::Json => {
            let file_layer = log_file.map(|file| {
                fmt::layer()
                    .json()
                    .with_timer(SystemTime)
                    .with_writer(file)
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
            });
            tracing::subscriber::set_global_default(
                registry
                    .with(
                        fmt::layer()
                            .json()
                            .with_timer(SystemTime)
                            .with_writer(io::stderr)
                            .with_target(true)
                            .with_current_span(true)
                            .with_span_list(false)
                            .flatten_event(true),
                    )
                    .with(file_layer),
            )?;
        }
    }

    tracing::info!(
        log_level = %config.level,
        log_format = %config.format,
        log_file = ?config.file,
        "Logging initialized"
    );

    Ok(())
}

/// Log levels accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase name understood by `EnvFilter`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!(
                "unknown log level: {s}. Expected one of: trace, debug, info, warn, error"
            )),
        }
    }
}
