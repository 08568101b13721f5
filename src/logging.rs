//! File logging.
//!
//! The terminal belongs to the TUI, so log output goes to
//! `<config_dir>/logs/eaptrust.log`. `EAPTRUST_LOG` takes an `EnvFilter`
//! directive and overrides the configured level.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::constants;

/// Install the global subscriber and return the log file path.
///
/// # Errors
///
/// Fails if the log directory or file cannot be created, or a subscriber is
/// already installed.
pub fn init(config_dir: &Path, default_level: &str) -> Result<PathBuf> {
    let logs_dir = config_dir.join(constants::LOGS_DIR_NAME);
    fs::create_dir_all(&logs_dir)
        .wrap_err_with(|| format!("failed to create {}", logs_dir.display()))?;
    let log_path = logs_dir.join(constants::LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .wrap_err_with(|| format!("failed to open {}", log_path.display()))?;

    let file_layer = fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_filter(filter(default_level));

    tracing_subscriber::registry()
        .with(file_layer)
        .try_init()
        .wrap_err("failed to install log subscriber")?;

    tracing::info!(version = constants::APP_VERSION, "Logging to {}", log_path.display());
    Ok(log_path)
}

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(constants::LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_level_falls_back() {
        // Only exercises parsing; the global subscriber is left alone.
        let filter = filter("not a level[");
        assert!(!filter.to_string().is_empty());
    }
}
