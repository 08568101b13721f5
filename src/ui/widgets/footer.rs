//! Footer widget with prompt-aware keybinding hints

use crate::ui::prompt::{ApprovalRequest, NotificationTap};
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the footer for whatever prompt is on screen
pub fn render(frame: &mut Frame, prompt: Option<&ApprovalRequest>, area: Rect) {
    let mut hints: Vec<(&str, &str)> = match prompt {
        Some(ApprovalRequest::Dialog(_)) => vec![
            ("←→", "Focus"),
            ("Enter", "Choose"),
            ("y", "Connect"),
            ("n", "Don't connect"),
            ("Esc", "Cancel"),
        ],
        Some(ApprovalRequest::Notification(n)) => {
            let open = match n.tap {
                NotificationTap::Review => "Review",
                NotificationTap::OpenLink(_) => "Help",
            };
            vec![("←→", "Focus"), ("Enter", "Press"), ("o", open)]
        }
        None => Vec::new(),
    };
    hints.push(("q", "Quit"));

    render_hints(frame, area, &hints);
}

fn render_hints(frame: &mut Frame, area: Rect, hints: &[(&str, &str)]) {
    let [left, right] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(16)]).areas(area);

    let max_width = left.width as usize;
    let mut spans = vec![Span::raw(" ")];
    let mut width = 1;

    for (i, (key, action)) in hints.iter().enumerate() {
        let sep = if i > 0 { 3 } else { 0 };
        let item = key.chars().count() + 1 + action.len() + sep;
        if width + item > max_width {
            break;
        }
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(Color::Rgb(50, 50, 50))));
        }
        spans.push(Span::styled(
            *key,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(*action, Style::default().fg(Color::DarkGray)));
        width += item;
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), left);

    let branding = Line::from(Span::styled(
        format!(
            "{} v{} ",
            crate::constants::APP_NAME,
            crate::constants::APP_VERSION
        ),
        Style::default().fg(crate::theme::NORD_POLAR_NIGHT_4),
    ));
    frame.render_widget(Paragraph::new(branding).alignment(Alignment::Right), right);
}
