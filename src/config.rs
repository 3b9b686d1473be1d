//! Runtime configuration loading from environment variables.
//!
//! All configuration values are loaded from `SLOWECHO_*` environment
//! variables with sensible defaults. Invalid values fall back to defaults
//! without crashing. Step parameters are not configured here; they come from
//! the command line or a job descriptor and are validated by the step.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `SLOWECHO_LOG_LEVEL` | info | Log filter directive |
//! | `SLOWECHO_LOG_FORMAT` | json | `json` or `pretty` |
//! | `SLOWECHO_LOG_FILE` | unset | Also write JSON logs to this file |
//! | `SLOWECHO_CHANNEL_CAPACITY` | 64 | Input/output channel capacity |

use crate::telemetry::LogConfig;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Effective configuration summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub log_level: String,
    pub log_format: String,
    pub log_file: Option<String>,
    pub channel_capacity: usize,
}

/// All configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub log: LogConfig,
    pub channel_capacity: usize,
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Load all configuration from environment variables.
pub fn load() -> EnvConfig {
    let channel_capacity = parse_usize("SLOWECHO_CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY);
    let channel_capacity = channel_capacity.max(1); // mpsc::channel panics on 0

    EnvConfig {
        log: LogConfig::from_env(),
        channel_capacity,
    }
}

impl EnvConfig {
    /// Return a printable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            log_level: self.log.level.clone(),
            log_format: self.log.format.as_str().to_string(),
            log_file: self
                .log
                .output_path
                .as_ref()
                .map(|p| p.display().to_string()),
            channel_capacity: self.channel_capacity,
        }
    }
}
