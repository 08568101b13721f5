//! Approval notification overlay.
//!
//! Non-modal card pinned to the top-right corner, shown for background
//! connections. The flow panel stays visible underneath.

use crate::theme;
use crate::ui::prompt::{NotificationRequest, NotificationTap};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Render the notification with button `focused` highlighted.
pub fn render(frame: &mut Frame, notification: &NotificationRequest, focused: usize) {
    let area = frame.area();
    let width = (area.width / 2).clamp(30, 56).min(area.width);

    let inner_width = usize::from(width.saturating_sub(4)).max(1);
    #[allow(clippy::cast_possible_truncation)]
    let text_lines = notification.message.len().div_ceil(inner_width).max(1) as u16;
    // message + tap hint + buttons + borders
    let height = (text_lines + 4).min(area.height);

    let card = Rect {
        x: area.width.saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height,
    }
    .intersection(area);

    frame.render_widget(Clear, card);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::WARNING))
        .title(Span::styled(
            format!(" {} ", notification.title),
            Style::default()
                .fg(Color::Black)
                .bg(theme::WARNING)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(card);
    frame.render_widget(block, card);

    let [text_area, hint_area, button_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(inner);

    frame.render_widget(
        Paragraph::new(notification.message.as_str())
            .style(Style::default().fg(theme::TEXT_PRIMARY))
            .wrap(Wrap { trim: true }),
        text_area,
    );

    let hint = match &notification.tap {
        NotificationTap::Review => "o: open details".to_string(),
        NotificationTap::OpenLink(link) => format!("o: {link}"),
    };
    frame.render_widget(
        Paragraph::new(hint).style(Style::default().fg(theme::TEXT_SECONDARY)),
        hint_area,
    );

    let mut spans = Vec::new();
    for (i, b) in notification.buttons.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let style = if i == focused {
            Style::default()
                .fg(theme::ROW_SELECTED_FG)
                .bg(theme::ROW_SELECTED_BG)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme::TEXT_SECONDARY)
        };
        spans.push(Span::styled(format!("[ {} ]", b.label), style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), button_area);
}
