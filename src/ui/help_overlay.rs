//! Help overlay listing the key bindings
//!
//! Drawn over the current view. View keys sit on the left with the active
//! view marked; movement and refresh keys sit on the right.

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use super::colors;
use crate::app::{App, AppState};

const OVERLAY_WIDTH: u16 = 64;
const OVERLAY_HEIGHT: u16 = 12;

const VIEW_KEYS: [(&str, AppState, &str); 3] = [
    ("1", AppState::Dashboard, "Dashboard"),
    ("2", AppState::Assignments, "Assignments"),
    ("3", AppState::Grades, "Grades"),
];

const OTHER_KEYS: [(&str, &str); 5] = [
    ("j / ↓", "Next row"),
    ("k / ↑", "Previous row"),
    ("r", "Reload stale data"),
    ("R", "Reload everything"),
    ("q / Esc", "Quit"),
];

/// Renders the help overlay on top of the current view
pub fn render(frame: &mut Frame, app: &App) {
    let area = overlay_area(frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Keys ")
        .title_bottom(Line::from(" ?, Esc or q closes ").right_aligned())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [views, other] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(inner);

    frame.render_widget(Paragraph::new(view_lines(app.state)), views);
    frame.render_widget(Paragraph::new(other_lines()), other);
}

fn section(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        title.to_string(),
        Style::default()
            .fg(colors::HEADER)
            .add_modifier(Modifier::BOLD),
    ))
}

fn key_line(key: &str, description: &str, active: bool) -> Line<'static> {
    let marker = if active { "▸" } else { " " };
    let description_style = if active {
        Style::default()
            .fg(colors::PRIMARY)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors::SECONDARY)
    };

    Line::from(vec![
        Span::styled(marker, Style::default().fg(colors::HEADER)),
        Span::styled(format!(" {:<8}", key), Style::default().fg(colors::ACCENT)),
        Span::styled(description.to_string(), description_style),
    ])
}

/// View keys, marking the one on screen
fn view_lines(current: AppState) -> Vec<Line<'static>> {
    let mut lines = vec![section("Views"), Line::from("")];
    lines.extend(
        VIEW_KEYS
            .iter()
            .map(|(key, state, name)| key_line(key, name, *state == current)),
    );
    lines.push(key_line("Tab", "Cycle views", false));
    lines
}

fn other_lines() -> Vec<Line<'static>> {
    let mut lines = vec![section("Rows and data"), Line::from("")];
    lines.extend(
        OTHER_KEYS
            .iter()
            .map(|(key, description)| key_line(key, description, false)),
    );
    lines
}

/// Fixed-size box centered in `area`, shrunk to fit small terminals
fn overlay_area(area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(OVERLAY_HEIGHT.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(OVERLAY_WIDTH.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    cell
}
