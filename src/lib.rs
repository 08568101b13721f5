//! eaptrust: certificate-trust approval for enterprise Wi-Fi networks.
//!
//! When a PEAP/TLS/TTLS network has no CA certificate, the user is asked
//! once whether to trust the server, either by pinning its certificate
//! (trust on first use) or by recording a plain approval. The
//! [`ApprovalMachine`](crate::core::machine::ApprovalMachine) drives that decision and
//! [`TrustController`](crate::core::controller::TrustController) serializes access to it.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod event;
pub mod logging;
pub mod state;
pub mod theme;
pub mod ui;
