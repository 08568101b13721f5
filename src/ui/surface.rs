//! Terminal implementation of the approval surfaces.
//!
//! The state machine runs on the controller thread while the render loop
//! owns the terminal, so the two meet in a [`PromptSlot`]: the controller
//! puts prompts in, the render loop draws whatever is there.

use std::sync::mpsc::Sender;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::machine::ConnectionOwner;
use crate::state::TrustOutcome;
use crate::ui::prompt::{ApprovalRequest, ApprovalSurface, UiHandle};

#[derive(Debug, Default)]
struct SlotState {
    current: Option<(UiHandle, ApprovalRequest)>,
    next_handle: u64,
}

/// The single on-screen prompt, shared between threads.
#[derive(Clone, Debug, Default)]
pub struct PromptSlot(Arc<Mutex<SlotState>>);

impl PromptSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The prompt currently on screen.
    #[must_use]
    pub fn current(&self) -> Option<(UiHandle, ApprovalRequest)> {
        self.0.lock().current.clone()
    }

    /// Remove the prompt the user just answered, if it is still `handle`.
    pub fn take_answered(&self, handle: UiHandle) {
        let mut slot = self.0.lock();
        if slot.current.as_ref().is_some_and(|(h, _)| *h == handle) {
            slot.current = None;
        }
    }
}

/// [`ApprovalSurface`] drawing into a [`PromptSlot`].
#[derive(Clone, Debug)]
pub struct TerminalSurface {
    slot: PromptSlot,
}

impl TerminalSurface {
    #[must_use]
    pub fn new(slot: PromptSlot) -> Self {
        Self { slot }
    }
}

impl ApprovalSurface for TerminalSurface {
    fn show(&mut self, request: ApprovalRequest) -> UiHandle {
        let mut slot = self.slot.0.lock();
        slot.next_handle += 1;
        let handle = UiHandle(slot.next_handle);
        tracing::debug!(?handle, ssid = request.ssid(), dialog = request.is_dialog(), "Showing prompt");
        slot.current = Some((handle, request));
        handle
    }

    fn dismiss(&mut self, handle: UiHandle) {
        let mut slot = self.slot.0.lock();
        if slot.current.as_ref().is_some_and(|(h, _)| *h == handle) {
            tracing::debug!(?handle, "Dismissing prompt");
            slot.current = None;
        }
    }
}

/// [`ConnectionOwner`] forwarding outcomes to the render loop.
#[derive(Debug)]
pub struct ChannelOwner {
    sender: Sender<TrustOutcome>,
}

impl ChannelOwner {
    #[must_use]
    pub fn new(sender: Sender<TrustOutcome>) -> Self {
        Self { sender }
    }

    fn send(&self, outcome: TrustOutcome) {
        if self.sender.send(outcome).is_err() {
            tracing::debug!("Outcome receiver is gone");
        }
    }
}

impl ConnectionOwner for ChannelOwner {
    fn on_accept(&mut self, ssid: &str) {
        self.send(TrustOutcome::Accepted(ssid.to_string()));
    }

    fn on_reject(&mut self, ssid: &str) {
        self.send(TrustOutcome::Rejected(ssid.to_string()));
    }

    fn on_error(&mut self, ssid: Option<&str>) {
        self.send(TrustOutcome::Errored(ssid.map(str::to_string)));
    }
}
