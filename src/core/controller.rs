//! Serialization point for the approval state machine.
//!
//! A dedicated worker thread owns the [`ApprovalMachine`] and drains a
//! command queue, so connection events, certificate intake and user
//! responses coming from different threads are applied one at a time.
//! Callers never block on the UI: only the calls that return a value wait
//! for the worker to answer.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use crate::core::certificate::ServerCertificate;
use crate::core::machine::ApprovalMachine;
use crate::state::{FlowState, NetworkProfile, PendingCertificate, PendingConnection};
use crate::ui::prompt::ApprovalResponse;

/// Read-only view of the machine for front ends.
#[derive(Clone, Debug, Default)]
pub struct FlowSnapshot {
    pub state: FlowState,
    pub connection: Option<PendingConnection>,
    pub certificate: Option<PendingCertificate>,
}

enum Command {
    Prepare(NetworkProfile, Sender<bool>),
    OfferCertificate(String, ServerCertificate, Sender<bool>),
    RequestApproval(bool, Sender<bool>),
    Respond(ApprovalResponse),
    ClearConnection,
    Snapshot(Sender<FlowSnapshot>),
    Shutdown,
}

/// Cloneable handle to the worker thread.
#[derive(Clone)]
pub struct TrustController {
    sender: Sender<Command>,
}

impl TrustController {
    /// Move `machine` onto a new worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn(machine: ApprovalMachine) -> std::io::Result<(Self, thread::JoinHandle<()>)> {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("trust-controller".to_string())
            .spawn(move || run(machine, &receiver))?;
        Ok((Self { sender }, handle))
    }

    /// See [`ApprovalMachine::prepare_connection`].
    pub fn prepare_connection(&self, profile: NetworkProfile) -> bool {
        self.ask(|reply| Command::Prepare(profile, reply))
    }

    /// See [`ApprovalMachine::offer_certificate`].
    pub fn offer_certificate(&self, ssid: impl Into<String>, certificate: ServerCertificate) -> bool {
        let ssid = ssid.into();
        self.ask(|reply| Command::OfferCertificate(ssid, certificate, reply))
    }

    /// See [`ApprovalMachine::request_approval`].
    pub fn request_approval(&self, user_initiated: bool) -> bool {
        self.ask(|reply| Command::RequestApproval(user_initiated, reply))
    }

    /// Queue a response from a surface. Never waits.
    pub fn respond(&self, response: ApprovalResponse) {
        self.send(Command::Respond(response));
    }

    pub fn clear_connection(&self) {
        self.send(Command::ClearConnection);
    }

    /// Current state, or the idle default once the worker has stopped.
    pub fn snapshot(&self) -> FlowSnapshot {
        let (reply, answer) = mpsc::channel();
        self.send(Command::Snapshot(reply));
        answer.recv().unwrap_or_default()
    }

    /// Ask the worker to stop after the commands already queued.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    fn send(&self, command: Command) {
        if self.sender.send(command).is_err() {
            tracing::debug!("Trust controller stopped, dropping command");
        }
    }

    fn ask(&self, build: impl FnOnce(Sender<bool>) -> Command) -> bool {
        let (reply, answer) = mpsc::channel();
        self.send(build(reply));
        answer.recv().unwrap_or(false)
    }
}

fn run(mut machine: ApprovalMachine, receiver: &Receiver<Command>) {
    tracing::debug!("Trust controller started");
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Prepare(profile, reply) => {
                let _ = reply.send(machine.prepare_connection(&profile));
            }
            Command::OfferCertificate(ssid, certificate, reply) => {
                let _ = reply.send(machine.offer_certificate(&ssid, certificate));
            }
            Command::RequestApproval(user_initiated, reply) => {
                let _ = reply.send(machine.request_approval(user_initiated));
            }
            Command::Respond(response) => machine.handle_response(response),
            Command::ClearConnection => machine.clear_connection(),
            Command::Snapshot(reply) => {
                let _ = reply.send(FlowSnapshot {
                    state: machine.state(),
                    connection: machine.pending_connection().cloned(),
                    certificate: machine.pending_certificate().cloned(),
                });
            }
            Command::Shutdown => break,
        }
    }
    tracing::debug!("Trust controller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{corp_profile, machine, server_cert, Event};
    use crate::ui::prompt::{ApprovalRequest, DialogChoice};

    #[test]
    fn test_commands_apply_in_order() {
        let (m, rec) = machine(true);
        let (controller, handle) = TrustController::spawn(m).unwrap();

        assert!(controller.prepare_connection(corp_profile(true, false)));
        assert!(controller.offer_certificate("corp", server_cert("CN=radius")));
        assert!(controller.request_approval(true));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.state, FlowState::AwaitingApproval);
        assert_eq!(snapshot.certificate.unwrap().subject.common_name, "radius");

        let Some(ApprovalRequest::Dialog(dialog)) = rec.last_shown() else {
            panic!("expected a dialog");
        };
        controller.respond(dialog.respond(DialogChoice::Positive));
        controller.shutdown();
        handle.join().unwrap();

        assert_eq!(rec.count(|e| matches!(e, Event::Accept(_))), 1);
    }

    #[test]
    fn test_calls_after_shutdown_are_dropped() {
        let (m, rec) = machine(true);
        let (controller, handle) = TrustController::spawn(m).unwrap();
        controller.shutdown();
        handle.join().unwrap();

        assert!(!controller.prepare_connection(corp_profile(true, false)));
        assert!(!controller.request_approval(true));
        controller.clear_connection();
        assert_eq!(controller.snapshot().state, FlowState::Idle);
        assert!(rec.events().is_empty());
    }

    #[test]
    fn test_handles_share_one_machine() {
        let (m, rec) = machine(false);
        let (controller, handle) = TrustController::spawn(m).unwrap();
        let other = controller.clone();

        let worker = thread::spawn(move || other.prepare_connection(corp_profile(false, false)));
        assert!(worker.join().unwrap());
        assert!(controller.request_approval(false));
        assert_eq!(controller.snapshot().state, FlowState::AwaitingApproval);

        controller.clear_connection();
        controller.shutdown();
        handle.join().unwrap();
        assert_eq!(rec.visible(), 0);
    }
}
