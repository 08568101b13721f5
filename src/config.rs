//! Application configuration.
//!
//! Settings live in `config.toml` inside the config directory
//! (`~/.config/eaptrust` by default). A missing file means defaults; a file
//! only needs the keys it wants to change.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;
use crate::core::machine::MachineSettings;

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV_VAR: &str = "EAPTRUST_CONFIG_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a config directory, use --config-dir")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of `config.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Wireless interface managed by the supplicant.
    pub interface: String,
    /// The device pins server certificates on first use.
    pub tofu_supported: bool,
    /// Help page shown with legacy prompts.
    pub ca_cert_help_link: String,
    /// Default log filter when `EAPTRUST_LOG` is unset.
    pub log_level: String,
    /// Log supplicant commands instead of running them.
    pub dry_run_bridge: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            interface: constants::DEFAULT_INTERFACE.to_string(),
            tofu_supported: true,
            ca_cert_help_link: constants::DEFAULT_CA_CERT_HELP_LINK.to_string(),
            log_level: "info".to_string(),
            dry_run_bridge: false,
        }
    }
}

impl AppConfig {
    /// Load `config.toml` from `dir`, falling back to defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(constants::CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Settings for the approval state machine.
    #[must_use]
    pub fn machine_settings(&self) -> MachineSettings {
        MachineSettings {
            tofu_supported: self.tofu_supported,
            interface: self.interface.clone(),
            help_link: self.ca_cert_help_link.clone(),
        }
    }
}

/// Resolve the config directory: explicit override first, then the
/// platform config directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoConfigDir`] if neither is available.
pub fn resolve_config_dir(explicit: Option<&Path>) -> Result<(PathBuf, &'static str), ConfigError> {
    if let Some(dir) = explicit {
        return Ok((dir.to_path_buf(), "override"));
    }
    dirs::config_dir()
        .map(|base| (base.join(constants::APP_NAME), "default"))
        .ok_or(ConfigError::NoConfigDir)
}
