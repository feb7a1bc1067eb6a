//! Dashboard screen rendering
//!
//! Shows the student's profile and standing, the active classes with their
//! professors, and a calendar of this month's due dates.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{colors, status_bar};
use crate::app::App;
use crate::calendar::{CalendarCell, CalendarMonth};
use crate::data::NOT_AVAILABLE;

const WEEKDAYS: &str = " Mo  Tu  We  Th  Fr  Sa  Su";

/// Renders the dashboard screen
///
/// # Arguments
/// * `frame` - The ratatui Frame to render to
/// * `app` - The application state containing profile, classes and calendar
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tabs
            Constraint::Length(3), // Profile
            Constraint::Min(5),    // Classes + calendar
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    status_bar::render_tabs(frame, chunks[0], app);
    render_profile(frame, app, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[2]);

    render_classes(frame, app, body[0]);
    render_calendar(frame, app.calendar.as_ref(), body[1]);

    status_bar::render_footer(frame, chunks[3], app);
}

fn render_profile(frame: &mut Frame, app: &App, area: Rect) {
    let name = app.profile.name.as_deref().unwrap_or(NOT_AVAILABLE);
    let year = app
        .academic_year
        .map(|y| y.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let mut spans = vec![
        Span::styled(
            name.to_string(),
            Style::default()
                .fg(colors::PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  ·  ", Style::default().fg(colors::UNKNOWN)),
        Span::styled(year, Style::default().fg(colors::ACCENT)),
    ];
    if let Some(gpa) = app.gpa {
        spans.push(Span::styled("  ·  ", Style::default().fg(colors::UNKNOWN)));
        spans.push(Span::styled(
            format!("GPA {:.2}", gpa),
            Style::default().fg(colors::PRIMARY),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_classes(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = Vec::with_capacity(app.courses.len() * 2);

    if app.courses.is_empty() {
        lines.push(Line::from(Span::styled(
            "No active classes",
            Style::default().fg(colors::UNKNOWN),
        )));
    }

    for (index, course) in app.courses.iter().enumerate() {
        let is_selected = index == app.selected_index;
        let cursor = if is_selected { "\u{25B8} " } else { "  " };
        let name_style = if is_selected {
            Style::default()
                .fg(colors::HEADER)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(colors::PRIMARY)
        };

        lines.push(Line::from(vec![
            Span::styled(cursor, Style::default().fg(colors::HEADER)),
            Span::styled(course.name.clone(), name_style),
        ]));
        lines.push(Line::from(Span::styled(
            format!(
                "    {} · {}",
                course.professor().unwrap_or(NOT_AVAILABLE),
                course.term_name()
            ),
            Style::default().fg(colors::SECONDARY),
        )));
    }

    let block = Block::default()
        .title(" Classes ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_calendar(frame: &mut Frame, calendar: Option<&CalendarMonth>, area: Rect) {
    let title = calendar
        .map(|c| format!(" {} ", c.title))
        .unwrap_or_else(|| " Calendar ".to_string());
    let lines = calendar.map(calendar_lines).unwrap_or_default();

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::HEADER));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Weekday header, one line per week, then the due list
fn calendar_lines(calendar: &CalendarMonth) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        WEEKDAYS,
        Style::default()
            .fg(colors::HEADER)
            .add_modifier(Modifier::BOLD),
    ))];

    for week in calendar.cells.chunks(7) {
        lines.push(Line::from(week.iter().map(day_span).collect::<Vec<_>>()));
    }

    let due: Vec<&CalendarCell> = calendar
        .cells
        .iter()
        .filter(|c| c.in_month && !c.assignments.is_empty())
        .collect();
    if !due.is_empty() {
        lines.push(Line::from(""));
    }
    for cell in due {
        for summary in &cell.assignments {
            lines.push(Line::from(vec![
                Span::styled(format!(" {:>2} ", cell.day), Style::default().fg(colors::ACCENT)),
                Span::styled(summary.name.clone(), Style::default().fg(colors::PRIMARY)),
                Span::styled(
                    format!(" ({})", summary.course_name),
                    Style::default().fg(colors::SECONDARY),
                ),
            ]));
        }
    }

    lines
}

/// A day number; `*` marks due dates
fn day_span(cell: &CalendarCell) -> Span<'static> {
    let marker = if cell.assignments.is_empty() { ' ' } else { '*' };
    let text = format!(" {:>2}{}", cell.day, marker);

    let style = if !cell.in_month {
        Style::default().fg(colors::UNKNOWN)
    } else if cell.is_today {
        Style::default()
            .fg(colors::ACCENT)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else if !cell.assignments.is_empty() {
        Style::default().fg(colors::ACCENT)
    } else {
        Style::default().fg(colors::PRIMARY)
    };

    Span::styled(text, style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::populated_lms;
    use crate::app::AppState;
    use crate::calendar::build_month;
    use crate::grades::AcademicYear;
    use crate::ui::test_support::render_to_string;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn dashboard_app() -> App {
        let mut app = App::new();
        app.state = AppState::Dashboard;
        app.courses = populated_lms().courses;
        app.profile.name = Some("Jordan Lee".to_string());
        app.academic_year = Some(AcademicYear::Sophomore);
        app
    }

    #[test]
    fn test_render_shows_profile_and_classes() {
        let app = dashboard_app();

        let content = render_to_string(|frame| render(frame, &app));

        assert!(content.contains("Jordan Lee"));
        assert!(content.contains("Sophomore"));
        assert!(content.contains("Chemistry"));
        assert!(content.contains("Prof History"));
    }

    #[test]
    fn test_render_without_classes() {
        let mut app = dashboard_app();
        app.courses.clear();
        app.profile.name = None;

        let content = render_to_string(|frame| render(frame, &app));

        assert!(content.contains("No active classes"));
        assert!(content.contains(NOT_AVAILABLE));
    }

    #[test]
    fn test_calendar_lines_mark_due_days() {
        let mut assignment = crate::aggregator::tests::assignment(1, "Lab Report");
        assignment.course_name = Some("Biology".to_string());
        assignment.due_at = Some(Utc.with_ymd_and_hms(2026, 10, 22, 9, 0, 0).unwrap());
        let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let month = build_month(today, &[assignment]);

        let lines = calendar_lines(&month);
        let text: Vec<String> = lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();

        assert_eq!(text[0], WEEKDAYS);
        // October 2026 starts on a Thursday: three lead days
        assert!(text[1].starts_with(" 28  29  30   1 "));
        assert!(text.iter().any(|l| l.contains(" 22*")));
        assert!(text.iter().any(|l| l.contains("Lab Report (Biology)")));
    }

    #[test]
    fn test_calendar_renders_title() {
        let mut app = dashboard_app();
        app.calendar = Some(build_month(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(), &[]));

        let content = render_to_string(|frame| render(frame, &app));

        assert!(content.contains("October 2026"));
        assert!(content.contains("Mo  Tu"));
    }
}
