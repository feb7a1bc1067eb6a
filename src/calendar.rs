//! Monthly calendar grid
//!
//! Builds the month shown on the dashboard: Monday-first weeks, leading
//! days from the previous month, and the assignments due on each day of
//! the current month.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::data::Assignment;

/// An assignment as listed inside a calendar cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentSummary {
    pub name: String,
    pub course_name: String,
}

/// One day slot of the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarCell {
    /// Day of its own month
    pub day: u32,
    /// False for spillover days from the previous month
    pub in_month: bool,
    pub is_today: bool,
    /// Assignments due this day, in input order
    pub assignments: Vec<AssignmentSummary>,
}

/// The month around a reference date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarMonth {
    /// e.g. "October 2026"
    pub title: String,
    pub cells: Vec<CalendarCell>,
}

/// Number of days in a month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// Monday-first weeks of a month, `0` marking slots outside it
pub fn month_weeks(year: i32, month: u32) -> Vec<[u32; 7]> {
    let lead = match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first) => first.weekday().num_days_from_monday() as usize,
        None => return Vec::new(),
    };

    let mut weeks = Vec::new();
    let mut week = [0u32; 7];
    let mut slot = lead;
    for day in 1..=days_in_month(year, month) {
        week[slot] = day;
        slot += 1;
        if slot == 7 {
            weeks.push(week);
            week = [0; 7];
            slot = 0;
        }
    }
    if slot != 0 {
        weeks.push(week);
    }
    weeks
}

/// Groups assignments due in `year`/`month` by day of month
///
/// Due dates are compared as UTC calendar dates. Assignments without a due
/// date or due in another month are skipped.
pub fn bucket_by_day(
    assignments: &[Assignment],
    year: i32,
    month: u32,
) -> HashMap<u32, Vec<AssignmentSummary>> {
    let mut buckets: HashMap<u32, Vec<AssignmentSummary>> = HashMap::new();
    for assignment in assignments {
        let Some(due) = assignment.due_at.map(|d| d.date_naive()) else {
            continue;
        };
        if due.year() != year || due.month() != month {
            continue;
        }
        buckets.entry(due.day()).or_default().push(AssignmentSummary {
            name: assignment.name.clone(),
            course_name: assignment.course_name().to_string(),
        });
    }
    buckets
}

/// Builds the calendar for the month containing `today`
///
/// Leading cells repeat the tail of the previous month; the grid stops on
/// the last day of the month without trailing cells.
pub fn build_month(today: NaiveDate, assignments: &[Assignment]) -> CalendarMonth {
    let (year, month) = (today.year(), today.month());
    let mut buckets = bucket_by_day(assignments, year, month);

    let lead = today
        .with_day(1)
        .map(|first| first.weekday().num_days_from_monday())
        .unwrap_or(0);
    let (prev_year, prev_month) = if month == 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    };
    let prev_days = days_in_month(prev_year, prev_month);

    let mut cells: Vec<CalendarCell> = (0..lead)
        .map(|i| CalendarCell {
            day: prev_days - lead + i + 1,
            in_month: false,
            is_today: false,
            assignments: Vec::new(),
        })
        .collect();

    cells.extend(
        month_weeks(year, month)
            .into_iter()
            .flatten()
            .filter(|day| *day != 0)
            .map(|day| CalendarCell {
                day,
                in_month: true,
                is_today: day == today.day(),
                assignments: buckets.remove(&day).unwrap_or_default(),
            }),
    );

    CalendarMonth {
        title: today.format("%B %Y").to_string(),
        cells,
    }
}
