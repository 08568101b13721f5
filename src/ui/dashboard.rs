//! Flow panel: the network being joined and the certificate it presented.

use crate::app::App;
use crate::state::{FlowState, TrustOutcome, TrustPolicy};
use crate::theme;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::BORDER_DEFAULT))
        .title(" Connection ");

    let mut lines = Vec::new();
    match &app.snapshot.connection {
        Some(connection) => {
            lines.push(field("Network", connection.identity.to_string()));
            let policy = match connection.policy {
                TrustPolicy::Tofu => "trust on first use",
                TrustPolicy::Legacy => "approve without CA",
            };
            lines.push(field("Policy", policy.to_string()));
        }
        None => lines.push(Line::from(Span::styled(
            "No pending connection",
            Style::default().fg(theme::TEXT_SECONDARY),
        ))),
    }

    let (state, color) = match app.snapshot.state {
        FlowState::Idle => ("idle", theme::INACTIVE),
        FlowState::AwaitingCertificate => ("waiting for certificate", theme::ACCENT_SECONDARY),
        FlowState::AwaitingApproval => ("waiting for your decision", theme::WARNING),
    };
    lines.push(Line::from(vec![
        Span::styled(format!("{:<12}", "State"), Style::default().fg(theme::TEXT_SECONDARY)),
        Span::styled(state, Style::default().fg(color).add_modifier(Modifier::BOLD)),
    ]));

    if let Some(cert) = &app.snapshot.certificate {
        lines.push(Line::default());
        lines.push(field("Subject", cert.subject.raw.clone()));
        lines.push(field("Issuer", cert.issuer.raw.clone()));
        lines.push(field("SHA-256", cert.certificate.fingerprint().to_string()));
    }

    if let Some(outcome) = &app.outcome {
        let (text, color) = match outcome {
            TrustOutcome::Accepted(_) => ("accepted", theme::SUCCESS),
            TrustOutcome::Rejected(_) => ("rejected", theme::ERROR),
            TrustOutcome::Errored(_) => ("aborted", theme::ERROR),
        };
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(text, Style::default().fg(color))));
    }

    if let Some(status) = &app.status {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(theme::ACCENT_PRIMARY),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<12}"), Style::default().fg(theme::TEXT_SECONDARY)),
        Span::styled(value, Style::default().fg(theme::TEXT_PRIMARY)),
    ])
}
