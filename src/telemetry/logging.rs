//! Tracing subscriber setup for the slowecho binary.
//!
//! Console output always goes to stderr, in JSON or pretty form; stdout
//! carries forwarded targets only. `SLOWECHO_LOG_FILE` adds a second JSON
//! layer writing to a file, so a run can be replayed from the file while the
//! console stays readable.

use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::EnvConfig;

pub const LOG_LEVEL_VAR: &str = "SLOWECHO_LOG_LEVEL";
pub const LOG_FORMAT_VAR: &str = "SLOWECHO_LOG_FORMAT";
pub const LOG_FILE_VAR: &str = "SLOWECHO_LOG_FILE";

const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(LogError::InvalidFormat(other.to_string())),
        }
    }
}

/// Console format, filter directive and optional JSON log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `info` or `slowecho::slowecho=debug`.
    pub level: String,
    pub output_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: DEFAULT_LEVEL.to_string(),
            output_path: None,
        }
    }
}

impl LogConfig {
    /// Read the `SLOWECHO_LOG_*` variables. Blank or unparsable values keep
    /// their defaults; a bad filter directive is only reported by
    /// [`init_logging`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let level = std::env::var(LOG_LEVEL_VAR)
            .ok()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(defaults.level);
        let format = std::env::var(LOG_FORMAT_VAR)
            .ok()
            .and_then(|f| f.parse().ok())
            .unwrap_or(defaults.format);
        let output_path = std::env::var(LOG_FILE_VAR)
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Self {
            format,
            level,
            output_path,
        }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),
    #[error("Failed to open log file: {0}")]
    FileOpen(String),
    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

/// Install the global subscriber for a run. Fails if one is already set.
pub fn init_logging(config: &EnvConfig) -> Result<(), LogError> {
    let log = &config.log;
    let filter =
        EnvFilter::try_new(&log.level).map_err(|e| LogError::InvalidFilter(e.to_string()))?;

    let file_layer = match &log.output_path {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| LogError::FileOpen(format!("{}: {e}", path.display())))?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_current_span(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };
    let json_console = (log.format == LogFormat::Json)
        .then(|| fmt::layer().json().with_writer(std::io::stderr));
    let pretty_console = (log.format == LogFormat::Pretty)
        .then(|| fmt::layer().pretty().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_console)
        .with(pretty_console)
        .with(file_layer)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)?;

    tracing::debug!(
        format = log.format.as_str(),
        level = %log.level,
        log_file = ?log.output_path,
        channel_capacity = config.channel_capacity,
        "logging initialized"
    );
    Ok(())
}
