//! Tab header and key-hint footer shared by the views

use chrono::Local;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::colors;
use crate::app::{App, AppState};

const TABS: [(AppState, &str); 3] = [
    (AppState::Dashboard, "1 Dashboard"),
    (AppState::Assignments, "2 Assignments"),
    (AppState::Grades, "3 Grades"),
];

/// Renders the app title and view tabs on one line
pub fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled(
            "STUDENT HUB",
            Style::default()
                .fg(colors::HEADER)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
    ];

    for (state, label) in TABS {
        let style = if app.state == state {
            Style::default()
                .fg(colors::ACCENT)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            Style::default().fg(colors::SECONDARY)
        };
        spans.push(Span::styled(format!(" {} ", label), style));
        spans.push(Span::raw(" "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Renders key hints, data freshness and the latest load error
pub fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![
        Span::styled("↑/↓", Style::default().fg(colors::ACCENT)),
        Span::raw(" Navigate  "),
        Span::styled("Tab", Style::default().fg(colors::ACCENT)),
        Span::raw(" View  "),
        Span::styled("r/R", Style::default().fg(colors::ACCENT)),
        Span::raw(" Refresh  "),
        Span::styled("?", Style::default().fg(colors::ACCENT)),
        Span::raw(" Help  "),
        Span::styled("q", Style::default().fg(colors::ACCENT)),
        Span::raw(" Quit"),
    ];

    if let Some(text) = freshness_text(app) {
        spans.push(Span::styled(text, Style::default().fg(colors::UNKNOWN)));
    }

    if let Some(error) = app.errors.first() {
        spans.push(Span::styled(
            format!(" │ {}", error),
            Style::default().fg(colors::BAD),
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().fg(colors::UNKNOWN));
    frame.render_widget(paragraph, area);
}

fn freshness_text(app: &App) -> Option<String> {
    let last_refresh = app.last_refresh?;
    let elapsed = Local::now() - last_refresh;
    let mins_ago = elapsed.num_minutes();
    Some(if mins_ago < 1 {
        " │ Data: just now".to_string()
    } else if mins_ago < 60 {
        format!(" │ Data: {}m ago", mins_ago)
    } else {
        format!(" │ Data: {}h ago", elapsed.num_hours())
    })
}
