//! Recording test doubles for the approval state machine.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::bridge::{BridgeError, ConnectionBridge};
use crate::core::certificate::ServerCertificate;
use crate::core::machine::{ApprovalMachine, Collaborators, ConnectionOwner, MachineSettings};
use crate::core::store::{CredentialStore, StoreError};
use crate::state::{EapMethod, EnterpriseConfig, NetworkProfile};
use crate::ui::prompt::{ApprovalRequest, ApprovalSurface, UiHandle};

/// Side effect observed by one of the doubles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    ApprovedWithoutCa(u32, bool),
    InstallCa(u32),
    TofuEnabled(u32, bool),
    Autoconnect(u32, bool),
    InvalidateSession(u32),
    ForgetAll(String),
    Show(UiHandle),
    Dismiss(UiHandle),
    Accept(String),
    Reject(String),
    Error(Option<String>),
}

impl Event {
    pub fn is_outcome(&self) -> bool {
        matches!(self, Self::Accept(_) | Self::Reject(_) | Self::Error(_))
    }
}

/// Store call forced to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreFailure {
    InstallCa,
}

#[derive(Default)]
struct Shared {
    events: Vec<Event>,
    shown: Vec<ApprovalRequest>,
    visible: BTreeSet<u64>,
    next_handle: u64,
    valid_trust: bool,
    failure: Option<StoreFailure>,
}

/// Shared log behind every double of one machine.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Shared>>);

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.0.lock().events.clone()
    }

    pub fn clear(&self) {
        self.0.lock().events.clear();
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.0.lock().events.iter().filter(|e| pred(e)).count()
    }

    pub fn last_shown(&self) -> Option<ApprovalRequest> {
        self.0.lock().shown.last().cloned()
    }

    /// Number of prompts shown and not dismissed.
    pub fn visible(&self) -> usize {
        self.0.lock().visible.len()
    }

    pub fn set_valid_trust(&self, valid: bool) {
        self.0.lock().valid_trust = valid;
    }

    pub fn fail_store(&self, failure: StoreFailure) {
        self.0.lock().failure = Some(failure);
    }

    fn push(&self, event: Event) {
        self.0.lock().events.push(event);
    }
}

impl CredentialStore for Recorder {
    fn has_valid_trust(&self, _profile: &NetworkProfile) -> bool {
        self.0.lock().valid_trust
    }

    fn mark_approved_without_ca(&mut self, network_id: u32, approved: bool) -> Result<(), StoreError> {
        self.push(Event::ApprovedWithoutCa(network_id, approved));
        Ok(())
    }

    fn install_ca_certificate(
        &mut self,
        network_id: u32,
        _certificate: &ServerCertificate,
    ) -> Result<(), StoreError> {
        if self.0.lock().failure == Some(StoreFailure::InstallCa) {
            return Err(StoreError::UnknownNetwork(network_id));
        }
        self.push(Event::InstallCa(network_id));
        Ok(())
    }

    fn set_tofu_enabled(&mut self, network_id: u32, enabled: bool) -> Result<(), StoreError> {
        self.push(Event::TofuEnabled(network_id, enabled));
        Ok(())
    }

    fn set_autoconnect_allowed(&mut self, network_id: u32, allowed: bool) -> Result<(), StoreError> {
        self.push(Event::Autoconnect(network_id, allowed));
        Ok(())
    }
}

impl ConnectionBridge for Recorder {
    fn invalidate_cached_session(&mut self, network_id: u32) -> Result<(), BridgeError> {
        self.push(Event::InvalidateSession(network_id));
        Ok(())
    }

    fn forget_all_credentials(&mut self, interface: &str) -> Result<(), BridgeError> {
        self.push(Event::ForgetAll(interface.to_string()));
        Ok(())
    }
}

impl ApprovalSurface for Recorder {
    fn show(&mut self, request: ApprovalRequest) -> UiHandle {
        let mut shared = self.0.lock();
        shared.next_handle += 1;
        let handle = UiHandle(shared.next_handle);
        shared.visible.insert(handle.0);
        shared.shown.push(request);
        shared.events.push(Event::Show(handle));
        handle
    }

    fn dismiss(&mut self, handle: UiHandle) {
        let mut shared = self.0.lock();
        shared.visible.remove(&handle.0);
        shared.events.push(Event::Dismiss(handle));
    }
}

impl ConnectionOwner for Recorder {
    fn on_accept(&mut self, ssid: &str) {
        self.push(Event::Accept(ssid.to_string()));
    }

    fn on_reject(&mut self, ssid: &str) {
        self.push(Event::Reject(ssid.to_string()));
    }

    fn on_error(&mut self, ssid: Option<&str>) {
        self.push(Event::Error(ssid.map(str::to_string)));
    }
}

pub fn settings(tofu_supported: bool) -> MachineSettings {
    MachineSettings {
        tofu_supported,
        interface: "wlan0".to_string(),
        help_link: "https://help.example/eap".to_string(),
    }
}

/// A machine whose collaborators all record into one [`Recorder`].
pub fn machine(tofu_supported: bool) -> (ApprovalMachine, Recorder) {
    let recorder = Recorder::default();
    let machine = ApprovalMachine::new(
        settings(tofu_supported),
        Collaborators {
            store: Box::new(recorder.clone()),
            bridge: Box::new(recorder.clone()),
            surface: Box::new(recorder.clone()),
            owner: Box::new(recorder.clone()),
        },
    );
    (machine, recorder)
}

/// PEAP network 5 "corp" without a CA certificate.
pub fn corp_profile(tofu_enabled: bool, approved_no_ca: bool) -> NetworkProfile {
    let mut ent = EnterpriseConfig::new(EapMethod::Peap);
    ent.tofu_enabled = tofu_enabled;
    ent.user_approved_no_ca_cert = approved_no_ca;
    NetworkProfile::new(5, "corp").with_enterprise(ent)
}

pub fn server_cert(subject: &str) -> ServerCertificate {
    ServerCertificate::from_parts(subject.as_bytes().to_vec(), subject, "CN=Corp Root CA, O=Corp")
}
