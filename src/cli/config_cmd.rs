//! Config CLI subcommands: show, defaults.
//!
//! These commands read configuration directly from environment variables.

use crate::config::{self, EffectiveConfig, DEFAULT_CHANNEL_CAPACITY};

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    print!("{}", render(&cfg));
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    println!("SLOWECHO_LOG_LEVEL=info");
    println!("SLOWECHO_LOG_FORMAT=json");
    println!("SLOWECHO_LOG_FILE=");
    println!("SLOWECHO_CHANNEL_CAPACITY={DEFAULT_CHANNEL_CAPACITY}");
}

fn render(cfg: &EffectiveConfig) -> String {
    format!(
        "SLOWECHO_LOG_LEVEL={}\nSLOWECHO_LOG_FORMAT={}\nSLOWECHO_LOG_FILE={}\nSLOWECHO_CHANNEL_CAPACITY={}\n",
        cfg.log_level,
        cfg.log_format,
        cfg.log_file.as_deref().unwrap_or(""),
        cfg.channel_capacity,
    )
}
