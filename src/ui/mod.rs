//! UI rendering module

mod dashboard;
mod overlays;
pub mod prompt;
pub mod surface;
mod widgets;

use crate::app::App;
use crate::ui::prompt::ApprovalRequest;
use ratatui::{
    layout::{Constraint, Layout},
    Frame,
};

/// Main render function - flow panel, footer, then the active prompt
pub fn render(frame: &mut Frame, app: &App) {
    let [main, footer] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(frame.area());

    dashboard::render(frame, app, main);

    let prompt = app.prompt();
    widgets::footer::render(frame, prompt.as_ref().map(|(_, p)| p), footer);

    match prompt {
        Some((_, ApprovalRequest::Dialog(dialog))) => {
            overlays::dialog::render(frame, &dialog, app.positive_focused);
        }
        Some((_, ApprovalRequest::Notification(notification))) => {
            overlays::notification::render(frame, &notification, app.notification_focus);
        }
        None => {}
    }
}
