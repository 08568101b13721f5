//! Approval dialog overlay.
//!
//! Modal popup centered over the flow panel, shown for user-initiated
//! connections.

use crate::theme;
use crate::ui::prompt::DialogRequest;
use ratatui::{
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Render the dialog. `positive_focused` selects the highlighted button.
#[allow(clippy::cast_possible_truncation)]
pub fn render(frame: &mut Frame, dialog: &DialogRequest, positive_focused: bool) {
    let mut body: Vec<Line> = dialog
        .message
        .iter()
        .map(|line| Line::from(Span::styled(line.as_str(), Style::default().fg(theme::TEXT_PRIMARY))))
        .collect();
    if let Some(link) = &dialog.help_link {
        body.push(Line::from(Span::styled(
            link.as_str(),
            Style::default()
                .fg(theme::ACCENT_SECONDARY)
                .add_modifier(Modifier::UNDERLINED),
        )));
    }

    let area = frame.area();
    let width = area.width.saturating_sub(4).clamp(30, 72);
    let inner_width = usize::from(width.saturating_sub(4)).max(1);
    let text_rows: usize = dialog
        .message
        .iter()
        .chain(dialog.help_link.iter())
        .map(|line| line.len().div_ceil(inner_width).max(1))
        .sum();
    // text + blank + buttons + borders
    let height = (text_rows + 4).min(usize::from(area.height)) as u16;

    let popup = centered_rect(width, height, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER_FOCUSED))
        .title(format!(" {} ", dialog.title))
        .title_bottom(Line::from(format!(" {} ", dialog.ssid)).right_aligned());
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [text_area, button_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);

    frame.render_widget(Paragraph::new(body).wrap(Wrap { trim: false }), text_area);

    let buttons = Line::from(vec![
        button(&dialog.negative_label, !positive_focused),
        Span::raw("   "),
        button(&dialog.positive_label, positive_focused),
    ]);
    frame.render_widget(
        Paragraph::new(buttons).alignment(Alignment::Right),
        button_area,
    );
}

fn button(label: &str, focused: bool) -> Span<'static> {
    let style = if focused {
        Style::default()
            .bg(theme::ROW_SELECTED_BG)
            .fg(theme::ROW_SELECTED_FG)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme::TEXT_SECONDARY)
    };
    Span::styled(format!("[ {label} ]"), style)
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::vertical([Constraint::Length(height)]).flex(Flex::Center);
    let horizontal = Layout::horizontal([Constraint::Length(width)]).flex(Flex::Center);

    let [area] = vertical.areas(area);
    let [area] = horizontal.areas(area);
    area
}
