//! Logging setup
//!
//! `LOOM_LOG` sets the level for the loom crates (default `warn`). Output
//! goes to stderr, or to `log_file` when the configuration names one.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::info;
use tracing_subscriber::EnvFilter;

use loom_core::Config;

const LOG_ENV: &str = "LOOM_LOG";
const DEFAULT_LEVEL: &str = "warn";

/// Install the global subscriber; a second call is a no-op
pub fn init_logging(config: &Config) {
    let level = std::env::var(LOG_ENV)
        .ok()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
    let env_filter = filter_for(&level);

    match config.log_file {
        Some(ref path) => {
            let file = match OpenOptions::new().create(true).append(true).open(path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", path, e);
                    return;
                }
            };

            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();

            info!("Logging to {:?}", path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::new(format!("loom_core={},loom_cli={}", level, level))
}
