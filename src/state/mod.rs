//! Application state types.

mod flow;
mod profile;

pub use flow::{
    FlowState, NetworkIdentity, PendingCertificate, PendingConnection, TrustOutcome, TrustPolicy,
};
pub use profile::{EapMethod, EnterpriseConfig, InstalledCaCert, NetworkProfile};
