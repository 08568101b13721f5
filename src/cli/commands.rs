//! CLI command handlers.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::thread::JoinHandle;

use color_eyre::eyre::{eyre, Result, WrapErr};

use crate::app::App;
use crate::config::AppConfig;
use crate::constants;
use crate::core::bridge::WpaCliBridge;
use crate::core::certificate::ServerCertificate;
use crate::core::controller::TrustController;
use crate::core::machine::{ApprovalMachine, Collaborators};
use crate::core::policy::{needs_approval, ApprovalRequirement};
use crate::core::store::{CredentialStore, JsonCredentialStore};
use crate::state::{EapMethod, EnterpriseConfig, NetworkProfile, TrustOutcome};
use crate::ui::surface::{ChannelOwner, PromptSlot, TerminalSurface};

/// Find a profile by network id or SSID.
///
/// # Errors
///
/// Fails if no saved network matches.
pub fn resolve_network<'a>(store: &'a JsonCredentialStore, network: &str) -> Result<&'a NetworkProfile> {
    network
        .parse::<u32>()
        .ok()
        .and_then(|id| store.profile(id))
        .or_else(|| store.find_by_ssid(network))
        .ok_or_else(|| eyre!("unknown network: {network}"))
}

/// `eaptrust list`
pub fn list(store: &JsonCredentialStore) {
    let profiles: Vec<&NetworkProfile> = store.profiles().collect();
    if profiles.is_empty() {
        println!("{}", constants::CLI_MSG_NO_PROFILES);
        return;
    }
    print!("{}", profile_table(&profiles));
}

fn profile_table(profiles: &[&NetworkProfile]) -> String {
    let yes_no = |b: bool| if b { "yes" } else { "-" };
    let mut out = format!(
        "{:<5} {:<24} {:<11} {:<20} {:<5} {:<9} {}\n",
        "ID", "SSID", "EAP", "CA", "TOFU", "APPROVED", "AUTO"
    );
    for p in profiles {
        let (eap, ca, tofu, approved) = match &p.enterprise {
            Some(ent) => (
                ent.eap_method.to_string(),
                ent.ca_certificate
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |ca| ca.common_name.clone()),
                yes_no(ent.tofu_enabled),
                yes_no(ent.user_approved_no_ca_cert),
            ),
            None => ("open".to_string(), "-".to_string(), "-", "-"),
        };
        let _ = writeln!(
            out,
            "{:<5} {:<24} {:<11} {:<20} {:<5} {:<9} {}",
            p.network_id,
            p.ssid,
            eap,
            ca,
            tofu,
            approved,
            yes_no(p.auto_connect)
        );
    }
    out
}

/// `eaptrust evaluate`
///
/// # Errors
///
/// Fails if the network is unknown.
pub fn evaluate(store: &JsonCredentialStore, config: &AppConfig, network: &str) -> Result<()> {
    let profile = resolve_network(store, network)?;
    println!("{}", describe_requirement(store, profile, config.tofu_supported));
    Ok(())
}

fn describe_requirement(store: &JsonCredentialStore, profile: &NetworkProfile, tofu_supported: bool) -> String {
    match needs_approval(profile, tofu_supported) {
        ApprovalRequirement::NotRequired(reason) => {
            format!("{}{reason}", constants::CLI_MSG_NO_APPROVAL)
        }
        ApprovalRequirement::Required(_) if store.has_valid_trust(profile) => {
            format!("{}a trusted certificate is stored", constants::CLI_MSG_NO_APPROVAL)
        }
        ApprovalRequirement::Required(policy) => {
            format!("{}{policy}", constants::CLI_MSG_APPROVAL_NEEDED)
        }
    }
}

/// `eaptrust reset`
///
/// # Errors
///
/// Fails if the network is unknown, not enterprise, or the store cannot be written.
pub fn reset(store: &mut JsonCredentialStore, network: &str) -> Result<()> {
    let profile = resolve_network(store, network)?;
    let (network_id, ssid) = (profile.network_id, profile.ssid.clone());
    store.reset_trust(network_id)?;
    tracing::info!(network_id, %ssid, "Trust decisions reset");
    println!("{}{ssid}", constants::CLI_MSG_TRUST_RESET);
    Ok(())
}

/// `eaptrust add`
///
/// # Errors
///
/// Fails if the store cannot be written.
pub fn add(
    store: &mut JsonCredentialStore,
    network_id: u32,
    ssid: &str,
    eap: Option<EapMethod>,
    tofu: bool,
) -> Result<()> {
    let mut profile = NetworkProfile::new(network_id, ssid);
    if let Some(method) = eap {
        let mut ent = EnterpriseConfig::new(method);
        ent.tofu_enabled = tofu;
        profile = profile.with_enterprise(ent);
    }
    store.upsert(profile)?;
    println!("{}{ssid} ({network_id})", constants::CLI_MSG_PROFILE_SAVED);
    Ok(())
}

/// `eaptrust connect`: run one approval flow in the TUI.
///
/// # Errors
///
/// Fails if the store or certificate cannot be read, the network is
/// unknown, or the terminal cannot be driven.
pub fn connect(
    config: &AppConfig,
    config_dir: &Path,
    network: &str,
    cert_path: &Path,
    background: bool,
    dry_run: bool,
) -> Result<()> {
    let store = JsonCredentialStore::open(config_dir)?;
    let profile = resolve_network(&store, network)?.clone();
    let data = fs::read(cert_path)
        .wrap_err_with(|| format!("failed to read {}", cert_path.display()))?;
    let certificate = match ServerCertificate::from_pem_or_der(&data) {
        Ok(cert) => Some(cert),
        Err(e) => {
            tracing::warn!(error = %e, path = %cert_path.display(), "Cannot decode server certificate");
            eprintln!("{}: {e}", constants::CLI_MSG_CERT_IGNORED);
            None
        }
    };
    let no_approval = describe_requirement(&store, &profile, config.tofu_supported);

    let slot = PromptSlot::new();
    let (outcome_tx, outcome_rx) = mpsc::channel();
    let machine = ApprovalMachine::new(
        config.machine_settings(),
        Collaborators {
            store: Box::new(store),
            bridge: Box::new(WpaCliBridge::new(config.interface.clone(), dry_run)),
            surface: Box::new(TerminalSurface::new(slot.clone())),
            owner: Box::new(ChannelOwner::new(outcome_tx)),
        },
    );
    let (controller, worker) =
        TrustController::spawn(machine).wrap_err("failed to start trust controller")?;

    let result = drive_flow(&controller, &profile, certificate, background, slot, outcome_rx);
    controller.shutdown();
    join_worker(worker)?;

    match result? {
        FlowResult::NotRequired => println!("{no_approval}"),
        FlowResult::Finished(outcome) => print_outcome(&outcome),
        FlowResult::Abandoned => println!("{}", constants::CLI_MSG_ABORTED),
    }
    Ok(())
}

fn join_worker(worker: JoinHandle<()>) -> Result<()> {
    worker.join().map_err(|_| {
        tracing::error!("Trust controller thread panicked");
        eyre!("trust controller thread panicked")
    })
}

enum FlowResult {
    NotRequired,
    Finished(TrustOutcome),
    Abandoned,
}

fn drive_flow(
    controller: &TrustController,
    profile: &NetworkProfile,
    certificate: Option<ServerCertificate>,
    background: bool,
    slot: PromptSlot,
    outcomes: mpsc::Receiver<TrustOutcome>,
) -> Result<FlowResult> {
    if !controller.prepare_connection(profile.clone()) {
        return Ok(FlowResult::NotRequired);
    }
    if let Some(cert) = certificate {
        if !controller.offer_certificate(profile.ssid.clone(), cert) {
            eprintln!("{}", constants::CLI_MSG_CERT_IGNORED);
        }
    }
    controller.request_approval(!background);

    // A flow that could not be presented has already resolved.
    if let Ok(outcome) = outcomes.try_recv() {
        return Ok(FlowResult::Finished(outcome));
    }

    let mut terminal = ratatui::init();
    let result = App::new(controller.clone(), slot, outcomes).run(&mut terminal);
    ratatui::restore();
    Ok(result?.map_or(FlowResult::Abandoned, FlowResult::Finished))
}

fn print_outcome(outcome: &TrustOutcome) {
    match outcome {
        TrustOutcome::Accepted(ssid) => println!("{}{ssid}", constants::CLI_MSG_ACCEPTED),
        TrustOutcome::Rejected(ssid) => println!("{}{ssid}", constants::CLI_MSG_REJECTED),
        TrustOutcome::Errored(_) => println!("{}", constants::CLI_MSG_ERRORED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_networks() -> (tempfile::TempDir, JsonCredentialStore) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonCredentialStore::open(dir.path()).unwrap();
        add(&mut store, 3, "cafe", None, false).unwrap();
        add(&mut store, 7, "corp", Some(EapMethod::Peap), true).unwrap();
        (dir, store)
    }

    #[test]
    fn test_resolve_by_id_or_ssid() {
        let (_dir, store) = store_with_networks();
        assert_eq!(resolve_network(&store, "7").unwrap().ssid, "corp");
        assert_eq!(resolve_network(&store, "cafe").unwrap().network_id, 3);
        assert!(resolve_network(&store, "lab").is_err());
    }

    #[test]
    fn test_describe_requirement() {
        let (_dir, store) = store_with_networks();
        let corp = resolve_network(&store, "corp").unwrap();
        assert_eq!(
            describe_requirement(&store, corp, true),
            format!("{}TOFU", constants::CLI_MSG_APPROVAL_NEEDED)
        );
        let cafe = resolve_network(&store, "cafe").unwrap();
        assert!(describe_requirement(&store, cafe, true).starts_with(constants::CLI_MSG_NO_APPROVAL));
    }

    #[test]
    fn test_reset_clears_approval() {
        let (dir, mut store) = store_with_networks();
        store.mark_approved_without_ca(7, true).unwrap();
        reset(&mut store, "corp").unwrap();

        let reopened = JsonCredentialStore::open(dir.path()).unwrap();
        let ent = reopened.profile(7).unwrap().enterprise.clone().unwrap();
        assert!(!ent.user_approved_no_ca_cert);
        assert!(ent.tofu_enabled);
        assert!(reset(&mut store, "cafe").is_err());
    }

    #[test]
    fn test_join_worker_reports_panic() {
        let ok = std::thread::spawn(|| {});
        assert!(join_worker(ok).is_ok());

        let crashed = std::thread::spawn(|| panic!("controller crashed"));
        let err = join_worker(crashed).unwrap_err();
        assert!(err.to_string().contains("panicked"));
    }

    #[test]
    fn test_profile_table_lists_every_network() {
        let (_dir, store) = store_with_networks();
        let profiles: Vec<&NetworkProfile> = store.profiles().collect();
        let table = profile_table(&profiles);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("cafe") && lines[1].contains("open"));
        assert!(lines[2].contains("corp") && lines[2].contains("PEAP"));
    }
}
