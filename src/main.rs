use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};

use eaptrust::cli::args::{Args, Commands};
use eaptrust::cli::commands;
use eaptrust::config::{self, AppConfig};
use eaptrust::constants;
use eaptrust::core::store::JsonCredentialStore;
use eaptrust::logging;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let (config_dir, config_source) = config::resolve_config_dir(args.config_dir.as_deref())?;
    let config = AppConfig::load(&config_dir)?;
    logging::init(&config_dir, &config.log_level)?;
    tracing::debug!(dir = %config_dir.display(), source = config_source, "Configuration loaded");

    let mut store = JsonCredentialStore::open(&config_dir)
        .wrap_err("failed to open the network profile store")?;

    match args.command.unwrap_or(Commands::List) {
        Commands::List => commands::list(&store),
        Commands::Evaluate { network } => commands::evaluate(&store, &config, &network)?,
        Commands::Reset { network } => commands::reset(&mut store, &network)?,
        Commands::Add {
            network_id,
            ssid,
            eap,
            tofu,
        } => commands::add(&mut store, network_id, &ssid, eap, tofu)?,
        Commands::Connect {
            network,
            cert,
            background,
        } => {
            let dry_run = args.dry_run || config.dry_run_bridge;
            if !dry_run && !is_root() {
                eprintln!("{}", constants::CLI_MSG_NOT_ROOT);
            }
            // The flow reopens the store on its own thread.
            drop(store);
            commands::connect(&config, &config_dir, &network, &cert, background, dry_run)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    true
}
