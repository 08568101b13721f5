//! Credential reset bridge to the supplicant.
//!
//! After a reject or an error the supplicant must not be able to resume the
//! previous EAP session from cached PMK material, otherwise a retried
//! connection would skip the approval gate. The state machine calls the
//! [`ConnectionBridge`] fire-and-forget; failures are only logged.

use std::process::Command;

use thiserror::Error;

use crate::constants;

/// Errors from the supplicant control interface.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        source: std::io::Error,
    },
    #[error("{command} failed: {output}")]
    CommandFailed { command: String, output: String },
}

/// Capability to drop cached credential material for the live connection.
pub trait ConnectionBridge {
    /// Remove cached session-resumption material (PMK) for a network.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] if the supplicant cannot be reached.
    fn invalidate_cached_session(&mut self, network_id: u32) -> Result<(), BridgeError>;

    /// Remove every configured network on `interface`, flushing the PMKSA cache.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError`] if the supplicant cannot be reached.
    fn forget_all_credentials(&mut self, interface: &str) -> Result<(), BridgeError>;
}

/// Invalidate the cached session (when the network is known) and forget all
/// credentials on the interface. Errors are logged and swallowed.
pub fn reset_credentials(bridge: &mut dyn ConnectionBridge, network_id: Option<u32>, interface: &str) {
    if let Some(network_id) = network_id {
        if let Err(e) = bridge.invalidate_cached_session(network_id) {
            tracing::warn!(network_id, error = %e, "Failed to invalidate cached session");
        }
    }
    if let Err(e) = bridge.forget_all_credentials(interface) {
        tracing::warn!(interface, error = %e, "Failed to forget stored credentials");
    }
}

/// Bridge that drives `wpa_supplicant` through `wpa_cli`.
#[derive(Debug, Clone)]
pub struct WpaCliBridge {
    interface: String,
    dry_run: bool,
}

impl WpaCliBridge {
    #[must_use]
    pub fn new(interface: impl Into<String>, dry_run: bool) -> Self {
        Self {
            interface: interface.into(),
            dry_run,
        }
    }

    /// Argument lists that will be passed to `wpa_cli` for a session reset.
    fn session_commands(&self, network_id: u32) -> Vec<Vec<String>> {
        vec![
            vec![
                "-i".to_string(),
                self.interface.clone(),
                "pmksa_flush".to_string(),
            ],
            vec![
                "-i".to_string(),
                self.interface.clone(),
                "disable_network".to_string(),
                network_id.to_string(),
            ],
        ]
    }

    fn forget_commands(interface: &str) -> Vec<Vec<String>> {
        vec![vec![
            "-i".to_string(),
            interface.to_string(),
            "remove_network".to_string(),
            "all".to_string(),
        ]]
    }

    fn run(&self, args: &[String]) -> Result<(), BridgeError> {
        let command = format!("{} {}", constants::WPA_CLI, args.join(" "));
        if self.dry_run {
            tracing::info!(%command, "Dry run: skipping supplicant command");
            return Ok(());
        }

        let output = Command::new(constants::WPA_CLI)
            .args(args)
            .output()
            .map_err(|source| BridgeError::Spawn {
                tool: constants::WPA_CLI,
                source,
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();

        // wpa_cli exits 0 even when the supplicant answers FAIL.
        if !output.status.success() || stdout.contains("FAIL") {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BridgeError::CommandFailed {
                command,
                output: if stderr.is_empty() { stdout } else { stderr },
            });
        }
        tracing::debug!(%command, "Supplicant command succeeded");
        Ok(())
    }
}

impl ConnectionBridge for WpaCliBridge {
    fn invalidate_cached_session(&mut self, network_id: u32) -> Result<(), BridgeError> {
        for args in self.session_commands(network_id) {
            self.run(&args)?;
        }
        Ok(())
    }

    fn forget_all_credentials(&mut self, interface: &str) -> Result<(), BridgeError> {
        for args in Self::forget_commands(interface) {
            self.run(&args)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingBridge {
        calls: Vec<&'static str>,
    }

    impl ConnectionBridge for FailingBridge {
        fn invalidate_cached_session(&mut self, _network_id: u32) -> Result<(), BridgeError> {
            self.calls.push("invalidate");
            Err(BridgeError::CommandFailed {
                command: "pmksa_flush".to_string(),
                output: "FAIL".to_string(),
            })
        }

        fn forget_all_credentials(&mut self, _interface: &str) -> Result<(), BridgeError> {
            self.calls.push("forget");
            Ok(())
        }
    }

    #[test]
    fn test_reset_continues_after_failure() {
        let mut bridge = FailingBridge { calls: Vec::new() };
        reset_credentials(&mut bridge, Some(4), "wlan0");
        assert_eq!(bridge.calls, vec!["invalidate", "forget"]);
    }

    #[test]
    fn test_reset_without_network_only_forgets() {
        let mut bridge = FailingBridge { calls: Vec::new() };
        reset_credentials(&mut bridge, None, "wlan0");
        assert_eq!(bridge.calls, vec!["forget"]);
    }

    #[test]
    fn test_wpa_cli_commands() {
        let bridge = WpaCliBridge::new("wlan1", true);
        let session = bridge.session_commands(12);
        assert_eq!(session[0], vec!["-i", "wlan1", "pmksa_flush"]);
        assert_eq!(session[1], vec!["-i", "wlan1", "disable_network", "12"]);
        assert_eq!(
            WpaCliBridge::forget_commands("wlan1")[0],
            vec!["-i", "wlan1", "remove_network", "all"]
        );
    }

    #[test]
    fn test_dry_run_never_spawns() {
        let mut bridge = WpaCliBridge::new("wlan0", true);
        assert!(bridge.invalidate_cached_session(1).is_ok());
        assert!(bridge.forget_all_credentials("wlan0").is_ok());
    }
}
