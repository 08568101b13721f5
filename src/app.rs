//! Interactive approval session.
//!
//! [`App`] is the render-loop side of a connection attempt: it draws the
//! flow and whatever prompt the controller put in the [`PromptSlot`], turns
//! key presses into [`ApprovalResponse`](crate::ui::prompt::ApprovalResponse)s
//! and stops once the controller reports an outcome.

use std::sync::mpsc::Receiver;

use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::DefaultTerminal;

use crate::constants;
use crate::core::controller::{FlowSnapshot, TrustController};
use crate::event::{Event, EventHandler};
use crate::state::TrustOutcome;
use crate::ui;
use crate::ui::prompt::{
    ApprovalRequest, DialogChoice, DialogRequest, NotificationAction, NotificationRequest,
    NotificationTap, UiHandle,
};
use crate::ui::surface::PromptSlot;

/// Render-loop state.
pub struct App {
    controller: TrustController,
    slot: PromptSlot,
    outcomes: Receiver<TrustOutcome>,
    /// Last state reported by the controller.
    pub snapshot: FlowSnapshot,
    /// Dialog focus; starts on the negative button.
    pub positive_focused: bool,
    /// Index of the focused notification button.
    pub notification_focus: usize,
    /// One-line message under the flow panel.
    pub status: Option<String>,
    pub outcome: Option<TrustOutcome>,
    pub should_quit: bool,
    focused_prompt: Option<UiHandle>,
}

impl App {
    #[must_use]
    pub fn new(controller: TrustController, slot: PromptSlot, outcomes: Receiver<TrustOutcome>) -> Self {
        Self {
            controller,
            slot,
            outcomes,
            snapshot: FlowSnapshot::default(),
            positive_focused: false,
            notification_focus: 0,
            status: None,
            outcome: None,
            should_quit: false,
            focused_prompt: None,
        }
    }

    /// The prompt currently on screen.
    #[must_use]
    pub fn prompt(&self) -> Option<(UiHandle, ApprovalRequest)> {
        self.slot.current()
    }

    /// Run until an outcome arrives or the user quits.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing fails or the event thread dies.
    pub fn run(mut self, terminal: &mut DefaultTerminal) -> Result<Option<TrustOutcome>> {
        let events = EventHandler::new(constants::DEFAULT_TICK_RATE);
        self.on_tick();
        while !self.should_quit {
            terminal.draw(|frame| ui::render(frame, &self))?;
            match events.next()? {
                Event::Key(key) => self.handle_key(key),
                Event::Resize(..) => {}
                Event::Tick => self.on_tick(),
            }
        }
        Ok(self.outcome)
    }

    /// Refresh the snapshot and collect a finished outcome.
    pub fn on_tick(&mut self) {
        // The snapshot round-trip also orders us after every queued response.
        self.snapshot = self.controller.snapshot();
        if let Ok(outcome) = self.outcomes.try_recv() {
            tracing::info!(?outcome, "Flow finished");
            self.outcome = Some(outcome);
            self.should_quit = true;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let quit = key.code == KeyCode::Char('q')
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL));
        if quit {
            // Leaving without an answer tears the flow down like a disconnect.
            self.controller.clear_connection();
            self.should_quit = true;
            return;
        }

        let Some((handle, request)) = self.prompt() else {
            return;
        };
        if self.focused_prompt != Some(handle) {
            self.focused_prompt = Some(handle);
            self.positive_focused = false;
            self.notification_focus = 0;
        }
        match request {
            ApprovalRequest::Dialog(dialog) => self.dialog_key(handle, &dialog, key.code),
            ApprovalRequest::Notification(notification) => {
                self.notification_key(&notification, key.code);
            }
        }
    }

    fn dialog_key(&mut self, handle: UiHandle, dialog: &DialogRequest, code: KeyCode) {
        let choice = match code {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h' | 'l') => {
                self.positive_focused = !self.positive_focused;
                return;
            }
            KeyCode::Enter if self.positive_focused => DialogChoice::Positive,
            KeyCode::Enter => DialogChoice::Negative,
            KeyCode::Char('y') => DialogChoice::Positive,
            KeyCode::Char('n') => DialogChoice::Negative,
            KeyCode::Esc => DialogChoice::Cancelled,
            _ => return,
        };
        tracing::debug!(?choice, ssid = %dialog.ssid, "Dialog answered");
        // A dialog reports exactly once.
        self.slot.take_answered(handle);
        self.controller.respond(dialog.respond(choice));
    }

    fn notification_key(&mut self, notification: &NotificationRequest, code: KeyCode) {
        let count = notification.buttons.len().max(1);
        let action = match code {
            KeyCode::Left => {
                self.notification_focus = (self.notification_focus + count - 1) % count;
                return;
            }
            KeyCode::Right | KeyCode::Tab => {
                self.notification_focus = (self.notification_focus + 1) % count;
                return;
            }
            KeyCode::Enter => match notification.buttons.get(self.notification_focus) {
                Some(button) => button.action,
                None => return,
            },
            KeyCode::Char('o') => NotificationAction::Tap,
            _ => return,
        };

        match notification.respond(action) {
            Some(response) => self.controller.respond(response),
            None => {
                if let NotificationTap::OpenLink(link) = &notification.tap {
                    self.status = Some(format!("{} {link}", constants::MSG_LEGACY_DIALOG_LINK));
                }
            }
        }
    }
}
