//! Approval flow state types.
//!
//! A flow exists from the moment a connection to an enterprise network
//! without trusted CA material starts until the user (or an error) resolves
//! it. Only one flow is ever active.

use crate::core::certificate::ServerCertificate;
use crate::core::subject::CertificateSubjectInfo;

/// Identity of the network a flow is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkIdentity {
    /// Network name; responses are matched against it.
    pub ssid: String,
    /// Persisted network id used for store and bridge calls.
    pub network_id: u32,
}

impl NetworkIdentity {
    #[must_use]
    pub fn new(ssid: impl Into<String>, network_id: u32) -> Self {
        Self {
            ssid: ssid.into(),
            network_id,
        }
    }
}

impl std::fmt::Display for NetworkIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (#{})", self.ssid, self.network_id)
    }
}

/// Trust policy chosen once when the flow starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Pin the server certificate as the network's CA on acceptance.
    Tofu,
    /// Remember acceptance as a boolean flag only.
    Legacy,
}

impl std::fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tofu => write!(f, "TOFU"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// The single active connection context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingConnection {
    pub identity: NetworkIdentity,
    /// The EAP method validates the server certificate.
    ///
    /// Informational: it comes from the policy evaluator, which never starts a
    /// flow for other methods, so it is `true` for every pending connection.
    pub requires_ca_cert: bool,
    pub policy: TrustPolicy,
}

/// Candidate server certificate awaiting a decision.
///
/// Subject and issuer fields are derived once at intake and never change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingCertificate {
    pub certificate: ServerCertificate,
    pub subject: CertificateSubjectInfo,
    pub issuer: CertificateSubjectInfo,
}

/// Observable stage of the approval state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FlowState {
    /// No flow is active.
    #[default]
    Idle,
    /// A flow exists but no prompt has been shown yet.
    AwaitingCertificate,
    /// A dialog or notification is waiting for the user.
    AwaitingApproval,
}

/// How a flow ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrustOutcome {
    Accepted(String),
    Rejected(String),
    /// No valid pending data; the SSID may be unknown.
    Errored(Option<String>),
}

impl TrustOutcome {
    /// SSID the outcome refers to, if known.
    #[must_use]
    pub fn ssid(&self) -> Option<&str> {
        match self {
            Self::Accepted(ssid) | Self::Rejected(ssid) => Some(ssid),
            Self::Errored(ssid) => ssid.as_deref(),
        }
    }
}
