//! Grade calculations
//!
//! Converts course percentages to letter grades and GPA points on a
//! standard plus/minus ladder, computes a credit-weighted GPA and derives
//! academic standing from earned credits.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::NO_GRADE;

/// Credit weight given to every course
pub const CREDITS_PER_COURSE: f64 = 3.0;

/// Minimum final score that earns credit toward standing
const PASSING_SCORE: f64 = 60.0;

/// Lower bound, letter and GPA points, highest first
const GRADE_LADDER: [(f64, &str, f64); 11] = [
    (93.0, "A", 4.0),
    (90.0, "A-", 3.7),
    (87.0, "B+", 3.3),
    (83.0, "B", 3.0),
    (80.0, "B-", 2.7),
    (77.0, "C+", 2.3),
    (73.0, "C", 2.0),
    (70.0, "C-", 1.7),
    (67.0, "D+", 1.3),
    (63.0, "D", 1.0),
    (60.0, "D-", 0.7),
];

fn ladder_step(percentage: f64) -> Option<(&'static str, f64)> {
    GRADE_LADDER
        .iter()
        .find(|(min, _, _)| percentage >= *min)
        .map(|(_, letter, points)| (*letter, *points))
}

/// Letter grade for a percentage, `"N/A"` when there is none
pub fn percentage_to_letter(percentage: Option<f64>) -> &'static str {
    match percentage {
        None => NO_GRADE,
        Some(pct) => ladder_step(pct).map(|(letter, _)| letter).unwrap_or("F"),
    }
}

/// GPA points for a percentage on the 4.0 scale
pub fn percentage_to_gpa_points(percentage: Option<f64>) -> Option<f64> {
    percentage.map(|pct| ladder_step(pct).map(|(_, points)| points).unwrap_or(0.0))
}

/// Credit-weighted GPA rounded to two decimals
///
/// Courses without a percentage are skipped. Returns `None` if no course
/// contributed.
pub fn compute_gpa<I>(percentages: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let (total_points, total_credits) = percentages
        .into_iter()
        .filter_map(percentage_to_gpa_points)
        .fold((0.0, 0.0), |(points, credits), gpa_points| {
            (
                points + gpa_points * CREDITS_PER_COURSE,
                credits + CREDITS_PER_COURSE,
            )
        });

    if total_credits == 0.0 {
        return None;
    }
    Some((total_points / total_credits * 100.0).round() / 100.0)
}

/// Class standing by earned credits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcademicYear {
    Freshman,
    Sophomore,
    Junior,
    Senior,
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AcademicYear::Freshman => "Freshman",
            AcademicYear::Sophomore => "Sophomore",
            AcademicYear::Junior => "Junior",
            AcademicYear::Senior => "Senior",
        };
        write!(f, "{}", name)
    }
}

/// Standing from enrollment final scores
///
/// Every enrollment with a final score of at least 60 earns 3 credits.
pub fn academic_year<I>(final_scores: I) -> AcademicYear
where
    I: IntoIterator<Item = Option<f64>>,
{
    let credits = final_scores
        .into_iter()
        .flatten()
        .filter(|score| *score >= PASSING_SCORE)
        .count() as f64
        * CREDITS_PER_COURSE;

    if credits < 30.0 {
        AcademicYear::Freshman
    } else if credits < 60.0 {
        AcademicYear::Sophomore
    } else if credits < 90.0 {
        AcademicYear::Junior
    } else {
        AcademicYear::Senior
    }
}

/// One course's grade as shown on the grades view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeSnapshot {
    pub course_id: u64,
    pub course_name: String,
    pub percentage: Option<f64>,
    pub letter: String,
    pub gpa_points: Option<f64>,
}

impl GradeSnapshot {
    pub fn new(course_id: u64, course_name: impl Into<String>, percentage: Option<f64>) -> Self {
        Self {
            course_id,
            course_name: course_name.into(),
            percentage,
            letter: percentage_to_letter(percentage).to_string(),
            gpa_points: percentage_to_gpa_points(percentage),
        }
    }
}
