//! Grades screen rendering
//!
//! One row per class with its percentage, letter grade and GPA points, and
//! the overall GPA underneath.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{colors, grade_color, status_bar};
use crate::app::App;
use crate::data::NO_GRADE;
use crate::grades::GradeSnapshot;

/// Renders the grades screen
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    status_bar::render_tabs(frame, chunks[0], app);
    render_table(frame, app, chunks[1]);
    render_gpa(frame, app.gpa, chunks[2]);
    status_bar::render_footer(frame, chunks[3], app);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        format!("  {:<32} {:>8} {:>7} {:>7}", "Class", "Percent", "Letter", "Points"),
        Style::default()
            .fg(colors::HEADER)
            .add_modifier(Modifier::BOLD),
    ))];

    if app.grades.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No grades available",
            Style::default().fg(colors::UNKNOWN),
        )));
    }

    for (index, snapshot) in app.grades.iter().enumerate() {
        lines.push(grade_row(snapshot, index == app.selected_index));
    }

    let block = Block::default()
        .title(" Grades ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn grade_row(snapshot: &GradeSnapshot, is_selected: bool) -> Line<'static> {
    let cursor = if is_selected { "\u{25B8} " } else { "  " };
    let percent = snapshot
        .percentage
        .map(|p| format!("{:.1}%", p))
        .unwrap_or_else(|| NO_GRADE.to_string());
    let points = snapshot
        .gpa_points
        .map(|p| format!("{:.1}", p))
        .unwrap_or_else(|| "-".to_string());
    let color = grade_color(snapshot.percentage);

    let name_style = if is_selected {
        Style::default()
            .fg(colors::HEADER)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(colors::PRIMARY)
    };

    Line::from(vec![
        Span::styled(cursor, Style::default().fg(colors::HEADER)),
        Span::styled(format!("{:<32}", truncate(&snapshot.course_name, 32)), name_style),
        Span::styled(format!(" {:>8}", percent), Style::default().fg(color)),
        Span::styled(format!(" {:>7}", snapshot.letter), Style::default().fg(color)),
        Span::styled(format!(" {:>7}", points), Style::default().fg(colors::SECONDARY)),
    ])
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn render_gpa(frame: &mut Frame, gpa: Option<f64>, area: Rect) {
    let text = match gpa {
        Some(gpa) => Span::styled(
            format!("GPA {:.2}", gpa),
            Style::default()
                .fg(colors::PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled("GPA unavailable", Style::default().fg(colors::UNKNOWN)),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    frame.render_widget(Paragraph::new(Line::from(text)).block(block), area);
}
