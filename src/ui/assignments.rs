//! Assignments screen rendering
//!
//! Lists every assignment by due date with its submission state, and shows
//! the details of the highlighted one.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{colors, status_bar};
use crate::app::App;
use crate::data::{Assignment, AssignmentDetails, SubmissionStatus};

/// Renders the assignments screen
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    status_bar::render_tabs(frame, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_list(frame, app, body[0]);
    render_details(frame, app, body[1]);

    status_bar::render_footer(frame, chunks[2], app);
}

fn format_due(assignment: &Assignment) -> String {
    assignment
        .due_at
        .map(|d| d.format("%b %d").to_string())
        .unwrap_or_else(|| "No due".to_string())
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::with_capacity(app.assignments.len());

    if app.assignments.is_empty() {
        lines.push(Line::from(Span::styled(
            "No assignments",
            Style::default().fg(colors::UNKNOWN),
        )));
    }

    // Keep the selection visible in short terminals
    let visible = area.height.saturating_sub(2) as usize;
    let skip = if visible > 0 && app.selected_index >= visible {
        app.selected_index + 1 - visible
    } else {
        0
    };

    for (index, assignment) in app.assignments.iter().enumerate().skip(skip) {
        let is_selected = index == app.selected_index;
        let cursor = if is_selected { "\u{25B8} " } else { "  " };
        let (mark, mark_color) = if assignment.is_submitted() {
            ("\u{2713}", colors::GOOD)
        } else {
            ("\u{2022}", colors::WARN)
        };
        let name_style = if is_selected {
            Style::default()
                .fg(colors::HEADER)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors::PRIMARY)
        };

        lines.push(Line::from(vec![
            Span::styled(cursor, Style::default().fg(colors::HEADER)),
            Span::styled(format!("{:<7}", format_due(assignment)), Style::default().fg(colors::ACCENT)),
            Span::raw(" "),
            Span::styled(mark, Style::default().fg(mark_color)),
            Span::raw(" "),
            Span::styled(assignment.name.clone(), name_style),
            Span::styled(
                format!("  {}", assignment.course_name()),
                Style::default().fg(colors::SECONDARY),
            ),
        ]));
    }

    let block = Block::default()
        .title(format!(" Assignments ({}) ", app.assignments.len()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_details(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));

    let Some(assignment) = app.selected_assignment() else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let professor = app
        .courses
        .iter()
        .find(|c| c.id == assignment.course_id)
        .and_then(|c| c.professor());
    let details = AssignmentDetails::from_assignment(assignment.clone(), professor);

    let paragraph = Paragraph::new(detail_lines(&details, assignment.html_url.as_deref()))
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<11}", label), Style::default().fg(colors::SECONDARY)),
        Span::styled(value, Style::default().fg(colors::PRIMARY)),
    ])
}

fn detail_lines(details: &AssignmentDetails, url: Option<&str>) -> Vec<Line<'static>> {
    let status_color = match details.status {
        SubmissionStatus::Submitted => colors::GOOD,
        SubmissionStatus::NotSubmitted => colors::WARN,
    };

    let mut lines = vec![
        Line::from(Span::styled(
            details.title.clone(),
            Style::default()
                .fg(colors::HEADER)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        field("Professor", details.professor.clone()),
        field(
            "Due",
            details
                .due_at
                .map(|d| d.format("%a %b %d %H:%M UTC").to_string())
                .unwrap_or_else(|| "No due date".to_string()),
        ),
        field(
            "Points",
            details
                .points_possible
                .map(|p| format!("{}", p))
                .unwrap_or_else(|| "-".to_string()),
        ),
        Line::from(vec![
            Span::styled(format!("{:<11}", "Status"), Style::default().fg(colors::SECONDARY)),
            Span::styled(details.status.to_string(), Style::default().fg(status_color)),
        ]),
        field("Grade", details.grade.clone()),
    ];

    if !details.submission_types.is_empty() {
        lines.push(field("Submit via", details.submission_types.join(", ")));
    }
    if let Some(url) = url {
        lines.push(field("Link", url.to_string()));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        details.description.clone(),
        Style::default().fg(colors::SECONDARY),
    )));
    lines
}
