//! Application-wide constants and configuration values.
//!
//! This module defines the static values used throughout eaptrust,
//! including file names, supplicant tooling, and the text of the approval
//! dialog and notification.

// === Application Metadata ===

/// Application name (from Cargo.toml).
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
/// Current application version (from Cargo.toml).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// === Timing Configuration ===

/// UI refresh rate in milliseconds.
pub const DEFAULT_TICK_RATE: u64 = 250;

// === Path Configuration ===

/// Name of the logs subdirectory.
pub const LOGS_DIR_NAME: &str = "logs";
/// Name of the log file inside the logs directory.
pub const LOG_FILE_NAME: &str = "eaptrust.log";
/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Name of the network profile store.
pub const PROFILES_FILE_NAME: &str = "networks.json";
/// Environment variable overriding the log filter.
pub const LOG_ENV_VAR: &str = "EAPTRUST_LOG";

// === Supplicant ===

/// Supplicant control tool.
pub const WPA_CLI: &str = "wpa_cli";
/// Default wireless interface.
pub const DEFAULT_INTERFACE: &str = "wlan0";
/// Default help page linked from the legacy dialog.
pub const DEFAULT_CA_CERT_HELP_LINK: &str =
    "https://en.wikipedia.org/wiki/Extensible_Authentication_Protocol";

// === Approval Dialog (TOFU) ===

pub const TITLE_TOFU_DIALOG: &str = "Certificate needs review";
pub const MSG_TOFU_DIALOG_HINT: &str =
    "Review the server certificate before connecting. Only connect if you trust it.";
pub const LABEL_SERVER_NAME: &str = "Server name: ";
pub const LABEL_ISSUER_NAME: &str = "Issuer name: ";
pub const LABEL_ORGANIZATION: &str = "Organization: ";
pub const LABEL_CONTACT: &str = "Contact: ";
pub const LABEL_FINGERPRINT: &str = "SHA-256 fingerprint: ";
pub const BTN_TOFU_CONTINUE: &str = "Connect";
pub const BTN_TOFU_ABORT: &str = "Don't connect";
/// Number of fingerprint hex digits shown in the dialog.
pub const FINGERPRINT_PREVIEW_LEN: usize = 16;

// === Approval Dialog (legacy) ===

pub const TITLE_LEGACY_DIALOG: &str = "Network without certificate validation";
pub const MSG_LEGACY_DIALOG_HINT: &str =
    "The network {} has no certificate that proves its identity. Connecting may expose your credentials.";
pub const MSG_LEGACY_DIALOG_LINK: &str = "Learn more:";
pub const BTN_LEGACY_CONTINUE: &str = "Connect anyway";
pub const BTN_LEGACY_ABORT: &str = "Don't connect";

// === Approval Notification ===

pub const TITLE_TOFU_NOTIFICATION: &str = "Certificate needs review";
pub const MSG_TOFU_NOTIFICATION: &str = "Review the certificate of {} before connecting.";
pub const BTN_TOFU_REVIEW: &str = "Review";
pub const TITLE_LEGACY_NOTIFICATION: &str = "Unverified network";
pub const MSG_LEGACY_NOTIFICATION: &str = "{} has no certificate. Connect anyway?";

// === Messages: CLI Output ===

pub const CLI_MSG_NO_PROFILES: &str = "No saved networks.";
pub const CLI_MSG_PROFILE_SAVED: &str = "Saved network: ";
pub const CLI_MSG_TRUST_RESET: &str = "Cleared trust decisions for ";
pub const CLI_MSG_NO_APPROVAL: &str = "No approval needed: ";
pub const CLI_MSG_APPROVAL_NEEDED: &str = "Approval needed under policy: ";
pub const CLI_MSG_ACCEPTED: &str = "Connection accepted: ";
pub const CLI_MSG_REJECTED: &str = "Connection rejected: ";
pub const CLI_MSG_ERRORED: &str = "Connection aborted, no valid certificate data";
pub const CLI_MSG_CERT_IGNORED: &str = "Certificate was not accepted for this connection";
pub const CLI_MSG_ABORTED: &str = "Closed before a decision was made";
pub const CLI_MSG_NOT_ROOT: &str =
    "Warning: not running as root, supplicant commands will probably fail (see --dry-run).";

/// Substitute the first `{}` placeholder in a message template.
#[must_use]
pub fn fill(template: &str, value: &str) -> String {
    template.replacen("{}", value, 1)
}
