//! Certificate-trust approval state machine.
//!
//! Tracks the single in-flight connection to an enterprise network that has
//! no CA certificate, caches the server certificate offered for it, asks the
//! user through one of the approval surfaces, and reconciles the answer with
//! the credential store, the supplicant and the connection owner.
//!
//! ```text
//! Idle ──prepare──▶ AwaitingCertificate ──request──▶ AwaitingApproval
//!   ▲                        │                             │
//!   └──── accept / reject / error / clear_connection ◀─────┘
//! ```
//!
//! Not thread-safe on its own; [`crate::core::controller::TrustController`]
//! serializes every entry point onto one thread.

use crate::core::bridge::{self, ConnectionBridge};
use crate::core::certificate::ServerCertificate;
use crate::core::policy::needs_approval;
use crate::core::store::{CredentialStore, StoreError};
use crate::state::{
    FlowState, NetworkIdentity, NetworkProfile, PendingCertificate, PendingConnection,
    TrustPolicy,
};
use crate::ui::prompt::{
    build_dialog, build_notification, ApprovalRequest, ApprovalResponse, ApprovalSurface,
    ResponseAction, ResponseSource, UiHandle,
};

/// Receives the final outcome of a flow, at most once per flow.
pub trait ConnectionOwner {
    fn on_accept(&mut self, ssid: &str);
    fn on_reject(&mut self, ssid: &str);
    /// `ssid` is `None` when the flow could not be identified.
    fn on_error(&mut self, ssid: Option<&str>);
}

/// Device-level settings of the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineSettings {
    /// The device can pin server certificates (TOFU).
    pub tofu_supported: bool,
    /// Wireless interface whose credentials are forgotten on reject/error.
    pub interface: String,
    /// Help page linked from the legacy prompts.
    pub help_link: String,
}

/// External collaborators driven by the state machine.
pub struct Collaborators {
    pub store: Box<dyn CredentialStore + Send>,
    pub bridge: Box<dyn ConnectionBridge + Send>,
    pub surface: Box<dyn ApprovalSurface + Send>,
    pub owner: Box<dyn ConnectionOwner + Send>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    AwaitingCertificate,
    AwaitingApproval,
}

#[derive(Debug)]
struct ActiveFlow {
    connection: PendingConnection,
    certificate: Option<PendingCertificate>,
    stage: Stage,
}

impl ActiveFlow {
    fn ssid(&self) -> &str {
        &self.connection.identity.ssid
    }

    fn network_id(&self) -> u32 {
        self.connection.identity.network_id
    }
}

/// The approval state machine.
pub struct ApprovalMachine {
    settings: MachineSettings,
    store: Box<dyn CredentialStore + Send>,
    bridge: Box<dyn ConnectionBridge + Send>,
    surface: Box<dyn ApprovalSurface + Send>,
    owner: Box<dyn ConnectionOwner + Send>,
    flow: Option<ActiveFlow>,
    prompt: Option<UiHandle>,
    /// Policy the notification actions are registered for.
    registration: Option<TrustPolicy>,
    /// SSID of the last flow that resolved or was abandoned.
    retired_ssid: Option<String>,
}

impl ApprovalMachine {
    #[must_use]
    pub fn new(settings: MachineSettings, collaborators: Collaborators) -> Self {
        let Collaborators {
            store,
            bridge,
            surface,
            owner,
        } = collaborators;
        Self {
            settings,
            store,
            bridge,
            surface,
            owner,
            flow: None,
            prompt: None,
            registration: None,
            retired_ssid: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &MachineSettings {
        &self.settings
    }

    /// Current stage of the flow.
    #[must_use]
    pub fn state(&self) -> FlowState {
        match self.flow.as_ref().map(|f| f.stage) {
            None => FlowState::Idle,
            Some(Stage::AwaitingCertificate) => FlowState::AwaitingCertificate,
            Some(Stage::AwaitingApproval) => FlowState::AwaitingApproval,
        }
    }

    #[must_use]
    pub fn pending_connection(&self) -> Option<&PendingConnection> {
        self.flow.as_ref().map(|f| &f.connection)
    }

    #[must_use]
    pub fn pending_certificate(&self) -> Option<&PendingCertificate> {
        self.flow.as_ref().and_then(|f| f.certificate.as_ref())
    }

    /// Start a connection attempt to `profile`.
    ///
    /// Any flow already in progress is dropped without a callback. Returns
    /// `true` if the attempt needs approval and a new flow was started.
    pub fn prepare_connection(&mut self, profile: &NetworkProfile) -> bool {
        if let Some(old) = self.flow.take() {
            tracing::info!(ssid = old.ssid(), "Abandoning pending flow for new connection");
            self.retired_ssid = Some(old.connection.identity.ssid);
        }
        self.dismiss_prompt();

        let requirement = needs_approval(profile, self.settings.tofu_supported);
        let Some(policy) = requirement.policy() else {
            self.registration = None;
            tracing::debug!(ssid = %profile.ssid, ?requirement, "No approval needed");
            return false;
        };
        if self.store.has_valid_trust(profile) {
            self.registration = None;
            tracing::debug!(ssid = %profile.ssid, "Network already has trust material");
            return false;
        }

        // The evaluator only requires approval for methods that validate the server.
        let requires_ca_cert = requirement.is_required();
        self.registration = Some(policy);
        self.flow = Some(ActiveFlow {
            connection: PendingConnection {
                identity: NetworkIdentity::new(profile.ssid.clone(), profile.network_id),
                requires_ca_cert,
                policy,
            },
            certificate: None,
            stage: Stage::AwaitingCertificate,
        });

        // A cached PMK would let the supplicant skip the EAP exchange.
        bridge::reset_credentials(
            self.bridge.as_mut(),
            Some(profile.network_id),
            &self.settings.interface,
        );
        tracing::info!(
            ssid = %profile.ssid,
            network_id = profile.network_id,
            %policy,
            "Started approval flow"
        );
        true
    }

    /// Cache the server certificate for the pending flow.
    ///
    /// Returns `false` (and changes nothing) unless a flow for exactly `ssid`
    /// exists, it has no certificate yet, and both subject and issuer parse.
    pub fn offer_certificate(&mut self, ssid: &str, certificate: ServerCertificate) -> bool {
        if ssid.is_empty() {
            return false;
        }
        let Some(flow) = self.flow.as_mut() else {
            tracing::debug!(ssid, "Certificate offered without a pending flow");
            return false;
        };
        if flow.ssid() != ssid {
            tracing::debug!(ssid, pending = flow.ssid(), "Certificate offered for another network");
            return false;
        }
        if flow.certificate.is_some() {
            tracing::warn!(ssid, "There is already a pending certificate, ignoring new one");
            return false;
        }

        let subject = match certificate.parse_subject() {
            Ok(info) => info,
            Err(e) => {
                tracing::error!(ssid, error = %e, "Certificate has no valid subject");
                return false;
            }
        };
        let issuer = match certificate.parse_issuer() {
            Ok(info) => info,
            Err(e) => {
                tracing::error!(ssid, error = %e, "Certificate has no valid issuer");
                return false;
            }
        };

        tracing::debug!(
            ssid,
            subject = %subject.common_name,
            issuer = %issuer.common_name,
            fingerprint = certificate.fingerprint(),
            "Cached pending certificate"
        );
        flow.certificate = Some(PendingCertificate {
            certificate,
            subject,
            issuer,
        });
        true
    }

    /// Ask the user to approve the pending flow.
    ///
    /// A user-initiated connection gets the dialog, a background one the
    /// notification. A TOFU flow without a certificate resolves as an error
    /// straight away. Returns `true` whenever approval was needed.
    pub fn request_approval(&mut self, user_initiated: bool) -> bool {
        let Some(flow) = self.flow.as_ref() else {
            return false;
        };
        if flow.connection.policy == TrustPolicy::Tofu && flow.certificate.is_none() {
            tracing::debug!(ssid = flow.ssid(), "No valid certificate for TOFU connection");
            let ssid = flow.ssid().to_string();
            self.resolve_error(Some(ssid));
            return true;
        }

        tracing::debug!(ssid = flow.ssid(), user_initiated, "Requesting user approval");
        if user_initiated {
            self.present_dialog();
        } else {
            self.present_notification();
        }
        true
    }

    /// Route a response from either approval surface.
    pub fn handle_response(&mut self, response: ApprovalResponse) {
        if response.source == ResponseSource::Notification
            && !self.is_registered_for(response.action)
        {
            tracing::debug!(?response, "Notification action is not registered, dropping");
            return;
        }

        match response.action {
            ResponseAction::Review => self.handle_review(response.ssid.as_deref()),
            ResponseAction::Accept => {
                if self.is_response_valid(response.ssid.as_deref()) {
                    self.resolve_accept();
                }
            }
            ResponseAction::Reject => {
                if self.is_response_valid(response.ssid.as_deref()) {
                    self.resolve_reject();
                }
            }
        }
    }

    /// Tear the flow down on disconnect. Trust decisions already made and
    /// cached credentials are left alone.
    pub fn clear_connection(&mut self) {
        self.registration = None;
        self.dismiss_prompt();
        if let Some(old) = self.flow.take() {
            tracing::debug!(ssid = old.ssid(), "Cleared pending flow");
            self.retired_ssid = Some(old.connection.identity.ssid);
        }
    }

    fn is_registered_for(&self, action: ResponseAction) -> bool {
        matches!(
            (self.registration, action),
            (Some(TrustPolicy::Tofu), ResponseAction::Review)
                | (
                    Some(TrustPolicy::Legacy),
                    ResponseAction::Accept | ResponseAction::Reject
                )
        )
    }

    // A response without a pending flow is either a duplicate for a flow that
    // already ended, or a sign the caller is stuck waiting; the latter is
    // recovered by resolving as an error.
    fn is_response_valid(&mut self, ssid: Option<&str>) -> bool {
        let Some(flow) = self.flow.as_ref() else {
            if ssid.is_some() && ssid == self.retired_ssid.as_deref() {
                tracing::debug!(?ssid, "Duplicate response for a finished flow");
            } else {
                tracing::warn!(?ssid, "Response without a pending flow");
                self.resolve_error(None);
            }
            return false;
        };
        if ssid != Some(flow.ssid()) {
            tracing::warn!(
                pending = flow.ssid(),
                ?ssid,
                "Response is for a different network, ignoring"
            );
            return false;
        }
        true
    }

    fn handle_review(&mut self, ssid: Option<&str>) {
        let is_current = self.flow.as_ref().is_some_and(|f| ssid == Some(f.ssid()));
        if !is_current {
            tracing::debug!(?ssid, "Review request for a stale flow");
            return;
        }
        self.dismiss_prompt();
        self.present_dialog();
    }

    fn present_dialog(&mut self) {
        let Some(flow) = self.flow.as_mut() else {
            return;
        };
        let Some(request) = build_dialog(
            &flow.connection,
            flow.certificate.as_ref(),
            &self.settings.help_link,
        ) else {
            tracing::error!(
                ssid = flow.ssid(),
                "Cannot launch a TOFU dialog without a pending certificate"
            );
            return;
        };
        flow.stage = Stage::AwaitingApproval;
        self.show(ApprovalRequest::Dialog(request));
    }

    fn present_notification(&mut self) {
        let Some(flow) = self.flow.as_mut() else {
            return;
        };
        let request = build_notification(&flow.connection, &self.settings.help_link);
        flow.stage = Stage::AwaitingApproval;
        self.show(ApprovalRequest::Notification(request));
    }

    fn show(&mut self, request: ApprovalRequest) {
        self.dismiss_prompt();
        self.prompt = Some(self.surface.show(request));
    }

    fn dismiss_prompt(&mut self) {
        if let Some(handle) = self.prompt.take() {
            self.surface.dismiss(handle);
        }
    }

    fn resolve_accept(&mut self) {
        let Some(flow) = self.flow.as_ref() else {
            return;
        };
        if flow.connection.policy == TrustPolicy::Tofu && flow.certificate.is_none() {
            let ssid = flow.ssid().to_string();
            self.resolve_error(Some(ssid));
            return;
        }

        self.dismiss_prompt();
        let Some(flow) = self.flow.take() else {
            return;
        };
        let network_id = flow.network_id();
        match (flow.connection.policy, flow.certificate.as_ref()) {
            (TrustPolicy::Tofu, Some(pending)) => {
                if let Err(e) = self
                    .store
                    .install_ca_certificate(network_id, &pending.certificate)
                {
                    // The user approved; keep this connection but prompt again next time.
                    tracing::error!(
                        network_id,
                        error = %e,
                        "Cannot install CA certificate, reverting trust flags"
                    );
                    log_store(
                        self.store.mark_approved_without_ca(network_id, false),
                        "reset approved without CA",
                    );
                    log_store(
                        self.store.set_tofu_enabled(network_id, false),
                        "disable TOFU",
                    );
                }
            }
            _ => {
                log_store(
                    self.store.mark_approved_without_ca(network_id, true),
                    "mark approved without CA",
                );
            }
        }
        log_store(
            self.store.set_autoconnect_allowed(network_id, true),
            "allow autoconnect",
        );

        let ssid = flow.connection.identity.ssid;
        tracing::info!(%ssid, network_id, "User accepted the network");
        self.retired_ssid = Some(ssid.clone());
        self.owner.on_accept(&ssid);
    }

    fn resolve_reject(&mut self) {
        self.dismiss_prompt();
        let Some(flow) = self.flow.take() else {
            return;
        };
        let network_id = flow.network_id();
        log_store(
            self.store.set_autoconnect_allowed(network_id, false),
            "forbid autoconnect",
        );
        bridge::reset_credentials(
            self.bridge.as_mut(),
            Some(network_id),
            &self.settings.interface,
        );

        let ssid = flow.connection.identity.ssid;
        tracing::info!(%ssid, network_id, "User rejected the network");
        self.retired_ssid = Some(ssid.clone());
        self.owner.on_reject(&ssid);
    }

    fn resolve_error(&mut self, ssid: Option<String>) {
        self.dismiss_prompt();
        let network_id = self.flow.take().map(|f| f.network_id());
        bridge::reset_credentials(self.bridge.as_mut(), network_id, &self.settings.interface);

        tracing::warn!(?ssid, "Approval flow ended without valid data");
        self.retired_ssid.clone_from(&ssid);
        self.owner.on_error(ssid.as_deref());
    }
}

fn log_store(result: Result<(), StoreError>, what: &str) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "Credential store failed to {what}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{
        corp_profile, machine, server_cert, Event, Recorder, StoreFailure,
    };
    use crate::state::{EapMethod, EnterpriseConfig, InstalledCaCert};
    use crate::ui::prompt::{DialogChoice, NotificationAction};

    fn dialog_response(recorder: &Recorder, choice: DialogChoice) -> ApprovalResponse {
        match recorder.last_shown().expect("a prompt was shown") {
            ApprovalRequest::Dialog(d) => d.respond(choice),
            ApprovalRequest::Notification(_) => panic!("expected a dialog"),
        }
    }

    fn tofu_flow_with_dialog() -> (ApprovalMachine, Recorder) {
        let (mut m, rec) = machine(true);
        assert!(m.prepare_connection(&corp_profile(true, false)));
        assert!(m.offer_certificate("corp", server_cert("CN=radius.corp, O=Corp")));
        assert!(m.request_approval(true));
        (m, rec)
    }

    // Scenario A
    #[test]
    fn test_ca_present_starts_no_flow() {
        for tofu_supported in [false, true] {
            let (mut m, rec) = machine(tofu_supported);
            let mut profile = corp_profile(true, true);
            if let Some(ent) = profile.enterprise.as_mut() {
                ent.ca_certificate = Some(InstalledCaCert {
                    fingerprint: "ab".repeat(32),
                    common_name: "Corp CA".to_string(),
                    der_hex: String::new(),
                });
            }
            assert!(!m.prepare_connection(&profile));
            assert_eq!(m.state(), FlowState::Idle);
            assert!(!m.request_approval(true));
            assert!(rec.events().is_empty());
        }
    }

    #[test]
    fn test_store_trust_starts_no_flow() {
        let (mut m, rec) = machine(true);
        rec.set_valid_trust(true);
        assert!(!m.prepare_connection(&corp_profile(true, false)));
        assert_eq!(m.state(), FlowState::Idle);
    }

    #[test]
    fn test_prepare_flushes_cached_session() {
        let (mut m, rec) = machine(true);
        assert!(m.prepare_connection(&corp_profile(true, false)));
        assert_eq!(m.state(), FlowState::AwaitingCertificate);
        assert_eq!(
            rec.events(),
            vec![Event::InvalidateSession(5), Event::ForgetAll("wlan0".to_string())]
        );
        let pending = m.pending_connection().unwrap();
        assert_eq!(pending.policy, TrustPolicy::Tofu);
        assert!(pending.requires_ca_cert);
    }

    #[test]
    fn test_legacy_flow_records_evaluator_result() {
        let (mut m, _rec) = machine(false);
        assert!(m.prepare_connection(&corp_profile(false, false)));
        let pending = m.pending_connection().unwrap();
        assert_eq!(pending.policy, TrustPolicy::Legacy);
        assert!(pending.requires_ca_cert);
    }

    // Scenario B
    #[test]
    fn test_tofu_accept_installs_certificate() {
        let (mut m, rec) = tofu_flow_with_dialog();
        assert_eq!(m.state(), FlowState::AwaitingApproval);
        assert_eq!(m.pending_certificate().unwrap().subject.common_name, "radius.corp");
        assert!(rec.last_shown().unwrap().is_dialog());
        rec.clear();

        m.handle_response(dialog_response(&rec, DialogChoice::Positive));

        let events = rec.events();
        assert!(events.contains(&Event::InstallCa(5)));
        assert!(events.contains(&Event::Autoconnect(5, true)));
        assert!(!events.iter().any(|e| matches!(e, Event::ForgetAll(_))));
        assert_eq!(rec.count(|e| matches!(e, Event::Accept(s) if s == "corp")), 1);
        assert_eq!(m.state(), FlowState::Idle);
        assert!(m.pending_certificate().is_none());
    }

    // Scenario C
    #[test]
    fn test_tofu_reject_forgets_credentials() {
        let (mut m, rec) = tofu_flow_with_dialog();
        rec.clear();

        m.handle_response(dialog_response(&rec, DialogChoice::Negative));

        let events = rec.events();
        assert!(events.contains(&Event::InvalidateSession(5)));
        assert!(events.contains(&Event::ForgetAll("wlan0".to_string())));
        assert!(events.contains(&Event::Autoconnect(5, false)));
        assert!(!events.contains(&Event::InstallCa(5)));
        assert_eq!(rec.count(|e| matches!(e, Event::Reject(s) if s == "corp")), 1);
        assert_eq!(m.state(), FlowState::Idle);
    }

    #[test]
    fn test_neutral_and_cancel_behave_like_reject() {
        for choice in [DialogChoice::Neutral, DialogChoice::Cancelled] {
            let (mut m, rec) = tofu_flow_with_dialog();
            rec.clear();
            m.handle_response(dialog_response(&rec, choice));
            assert_eq!(rec.count(|e| matches!(e, Event::Reject(_))), 1);
            assert!(rec.events().contains(&Event::Autoconnect(5, false)));
        }
    }

    // Scenario D
    #[test]
    fn test_tofu_request_without_certificate_errors() {
        let (mut m, rec) = machine(true);
        assert!(m.prepare_connection(&corp_profile(true, false)));
        rec.clear();

        assert!(m.request_approval(true));

        let events = rec.events();
        assert!(events.contains(&Event::ForgetAll("wlan0".to_string())));
        assert!(events.contains(&Event::Error(Some("corp".to_string()))));
        assert!(rec.last_shown().is_none());
        assert_eq!(m.state(), FlowState::Idle);
    }

    // Scenario E
    #[test]
    fn test_legacy_previously_approved_starts_no_flow() {
        let (mut m, _rec) = machine(false);
        assert!(!m.prepare_connection(&corp_profile(false, true)));
        assert_eq!(m.state(), FlowState::Idle);
    }

    #[test]
    fn test_legacy_accept_marks_network_approved() {
        let (mut m, rec) = machine(false);
        assert!(m.prepare_connection(&corp_profile(false, false)));
        assert!(m.request_approval(true));
        let shown = rec.last_shown().unwrap();
        assert!(matches!(&shown, ApprovalRequest::Dialog(d) if d.policy == TrustPolicy::Legacy));
        rec.clear();

        m.handle_response(dialog_response(&rec, DialogChoice::Positive));

        let events = rec.events();
        assert!(events.contains(&Event::ApprovedWithoutCa(5, true)));
        assert!(events.contains(&Event::Autoconnect(5, true)));
        assert!(!events.contains(&Event::InstallCa(5)));
        assert_eq!(rec.count(|e| matches!(e, Event::Accept(_))), 1);
    }

    #[test]
    fn test_legacy_notification_actions() {
        let (mut m, rec) = machine(false);
        assert!(m.prepare_connection(&corp_profile(false, false)));
        assert!(m.request_approval(false));
        let ApprovalRequest::Notification(notification) = rec.last_shown().unwrap() else {
            panic!("expected a notification");
        };
        assert_eq!(m.state(), FlowState::AwaitingApproval);

        m.handle_response(notification.respond(NotificationAction::Reject).unwrap());
        assert_eq!(rec.count(|e| matches!(e, Event::Reject(_))), 1);
    }

    #[test]
    fn test_tofu_notification_review_opens_dialog() {
        let (mut m, rec) = machine(true);
        assert!(m.prepare_connection(&corp_profile(true, false)));
        assert!(m.offer_certificate("corp", server_cert("CN=radius")));
        assert!(m.request_approval(false));
        let ApprovalRequest::Notification(notification) = rec.last_shown().unwrap() else {
            panic!("expected a notification");
        };

        m.handle_response(notification.respond(NotificationAction::Tap).unwrap());

        assert!(rec.last_shown().unwrap().is_dialog());
        // The notification was dismissed before the dialog appeared.
        assert_eq!(rec.count(|e| matches!(e, Event::Dismiss(_))), 1);
        assert_eq!(rec.visible(), 1);
        assert_eq!(m.state(), FlowState::AwaitingApproval);
        assert!(!rec.events().iter().any(|e| e.is_outcome()));
    }

    #[test]
    fn test_notification_action_ignored_when_not_registered() {
        let (mut m, rec) = tofu_flow_with_dialog();
        rec.clear();
        // TOFU registers only the review action.
        m.handle_response(ApprovalResponse::from_notification(
            "corp",
            ResponseAction::Accept,
        ));
        assert!(rec.events().is_empty());
        assert_eq!(m.state(), FlowState::AwaitingApproval);

        m.clear_connection();
        rec.clear();
        m.handle_response(ApprovalResponse::from_notification(
            "corp",
            ResponseAction::Review,
        ));
        assert!(rec.events().is_empty());
    }

    #[test]
    fn test_ca_install_failure_still_accepts() {
        let (mut m, rec) = tofu_flow_with_dialog();
        rec.fail_store(StoreFailure::InstallCa);
        rec.clear();

        m.handle_response(dialog_response(&rec, DialogChoice::Positive));

        let events = rec.events();
        assert!(events.contains(&Event::ApprovedWithoutCa(5, false)));
        assert!(events.contains(&Event::TofuEnabled(5, false)));
        assert!(events.contains(&Event::Autoconnect(5, true)));
        assert_eq!(rec.count(|e| matches!(e, Event::Accept(_))), 1);
        assert!(!events.iter().any(|e| matches!(e, Event::ForgetAll(_))));
    }

    #[test]
    fn test_second_certificate_is_ignored() {
        let (mut m, _rec) = machine(true);
        assert!(m.prepare_connection(&corp_profile(true, false)));
        assert!(m.offer_certificate("corp", server_cert("CN=first")));
        assert!(!m.offer_certificate("corp", server_cert("CN=second")));
        assert!(!m.offer_certificate("corp", server_cert("CN=third, O=Other")));
        assert_eq!(m.pending_certificate().unwrap().subject.common_name, "first");
    }

    #[test]
    fn test_certificate_for_other_network_is_ignored() {
        let (mut m, _rec) = machine(true);
        assert!(!m.offer_certificate("corp", server_cert("CN=radius")));
        assert!(m.prepare_connection(&corp_profile(true, false)));
        assert!(!m.offer_certificate("guest", server_cert("CN=radius")));
        assert!(!m.offer_certificate("", server_cert("CN=radius")));
        assert!(!m.offer_certificate("Corp", server_cert("CN=radius")));
        assert!(m.pending_certificate().is_none());
    }

    #[test]
    fn test_malformed_certificate_names_are_rejected() {
        let (mut m, rec) = machine(true);
        assert!(m.prepare_connection(&corp_profile(true, false)));
        let no_cn = ServerCertificate::from_parts(vec![1], "O=Corp", "CN=Root");
        assert!(!m.offer_certificate("corp", no_cn));
        let bad_issuer = ServerCertificate::from_parts(vec![2], "CN=radius", "O=Root");
        assert!(!m.offer_certificate("corp", bad_issuer));
        assert!(m.pending_certificate().is_none());
        assert_eq!(m.state(), FlowState::AwaitingCertificate);

        // A later request for approval cannot proceed.
        rec.clear();
        assert!(m.request_approval(true));
        assert_eq!(rec.count(|e| matches!(e, Event::Error(_))), 1);
        // A good certificate is still accepted after failures.
        assert!(m.prepare_connection(&corp_profile(true, false)));
        assert!(m.offer_certificate("corp", server_cert("CN=radius")));
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let (mut m, rec) = tofu_flow_with_dialog();
        rec.clear();
        m.handle_response(ApprovalResponse::from_dialog("guest", ResponseAction::Accept));
        m.handle_response(ApprovalResponse::from_dialog("guest", ResponseAction::Reject));
        m.handle_response(ApprovalResponse {
            ssid: None,
            action: ResponseAction::Accept,
            source: ResponseSource::Dialog,
        });
        assert!(rec.events().is_empty());
        assert_eq!(m.state(), FlowState::AwaitingApproval);
    }

    #[test]
    fn test_response_without_flow_escalates_to_error() {
        let (mut m, rec) = machine(true);
        m.handle_response(ApprovalResponse::from_dialog("corp", ResponseAction::Accept));
        assert_eq!(
            rec.events(),
            vec![Event::ForgetAll("wlan0".to_string()), Event::Error(None)]
        );
    }

    #[test]
    fn test_duplicate_resolution_is_a_no_op() {
        let (mut m, rec) = tofu_flow_with_dialog();
        let accept = dialog_response(&rec, DialogChoice::Positive);
        m.handle_response(accept.clone());
        rec.clear();

        m.handle_response(accept);
        m.handle_response(ApprovalResponse::from_dialog("corp", ResponseAction::Reject));
        assert!(rec.events().is_empty());
    }

    #[test]
    fn test_duplicate_reject_does_not_invalidate_twice() {
        let (mut m, rec) = tofu_flow_with_dialog();
        rec.clear();
        let reject = dialog_response(&rec, DialogChoice::Negative);
        m.handle_response(reject.clone());
        m.handle_response(reject);
        assert_eq!(rec.count(|e| matches!(e, Event::ForgetAll(_))), 1);
        assert_eq!(rec.count(|e| matches!(e, Event::Reject(_))), 1);
    }

    #[test]
    fn test_new_connection_supersedes_silently() {
        let (mut m, rec) = tofu_flow_with_dialog();
        let old_dialog = dialog_response(&rec, DialogChoice::Positive);
        rec.clear();

        let mut other = corp_profile(true, false);
        other.network_id = 9;
        other.ssid = "lab".to_string();
        assert!(m.prepare_connection(&other));

        assert!(!rec.events().iter().any(|e| e.is_outcome()));
        assert_eq!(rec.visible(), 0);
        assert_eq!(m.pending_connection().unwrap().identity.ssid, "lab");
        assert!(m.pending_certificate().is_none());

        // A late answer to the abandoned dialog does not touch the new flow.
        rec.clear();
        m.handle_response(old_dialog);
        assert!(rec.events().is_empty());
        assert_eq!(m.state(), FlowState::AwaitingCertificate);
    }

    #[test]
    fn test_clear_connection_keeps_credentials() {
        let (mut m, rec) = tofu_flow_with_dialog();
        rec.clear();
        m.clear_connection();

        assert_eq!(m.state(), FlowState::Idle);
        assert_eq!(rec.visible(), 0);
        let events = rec.events();
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::ForgetAll(_) | Event::InvalidateSession(_))));
        assert!(!events.iter().any(|e| e.is_outcome()));
    }

    #[test]
    fn test_only_one_prompt_is_visible() {
        let (mut m, rec) = tofu_flow_with_dialog();
        assert!(m.request_approval(false));
        assert!(m.request_approval(true));
        assert_eq!(rec.visible(), 1);
    }

    #[test]
    fn test_open_network_supersedes_flow() {
        let (mut m, rec) = tofu_flow_with_dialog();
        let open = NetworkProfile::new(2, "cafe");
        assert!(!m.prepare_connection(&open));
        assert_eq!(m.state(), FlowState::Idle);
        assert_eq!(rec.visible(), 0);
    }

    #[test]
    fn test_method_without_server_cert_has_no_flow() {
        let (mut m, _rec) = machine(true);
        let mut ent = EnterpriseConfig::new(EapMethod::Aka);
        ent.tofu_enabled = true;
        let profile = NetworkProfile::new(5, "corp").with_enterprise(ent);
        assert!(!m.prepare_connection(&profile));
    }
}
