//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::CONFIG_DIR_ENV_VAR;
use crate::state::EapMethod;

/// eaptrust - approve enterprise Wi-Fi networks that have no CA certificate
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding config.toml, networks.json and logs
    #[arg(long, global = true, env = CONFIG_DIR_ENV_VAR)]
    pub config_dir: Option<PathBuf>,

    /// Log supplicant commands instead of running them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Subcommand to execute (defaults to `list`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show saved networks and their trust state
    List,
    /// Explain whether connecting to a network needs approval
    Evaluate {
        /// SSID or network id
        network: String,
    },
    /// Run the approval flow for a network with the certificate its server presented
    Connect {
        /// SSID or network id
        network: String,
        /// Server certificate (PEM or DER)
        #[arg(long)]
        cert: PathBuf,
        /// Treat the attempt as an automatic reconnect (notification instead of dialog)
        #[arg(long)]
        background: bool,
    },
    /// Forget the pinned certificate and approval of a network
    Reset {
        /// SSID or network id
        network: String,
    },
    /// Save a network profile
    Add {
        network_id: u32,
        ssid: String,
        /// EAP method (PEAP, TLS, TTLS, PWD, SIM, AKA, AKA_PRIME, UNAUTH_TLS, WAPI_CERT);
        /// omit for a non-enterprise network
        #[arg(long)]
        eap: Option<EapMethod>,
        /// Allow trust on first use for this network
        #[arg(long)]
        tofu: bool,
    },
}
