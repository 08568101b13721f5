//! Trust workflow: certificate intake, policy, persistence and the approval
//! state machine.

pub mod bridge;
pub mod certificate;
pub mod controller;
pub mod machine;
pub mod policy;
pub mod store;
pub mod subject;

#[cfg(test)]
pub(crate) mod testing;
