//! Core data models for Student Hub
//!
//! This module contains the LMS record types shared by the aggregation layer,
//! the calendar and the dashboard, plus the per-service API clients.

pub mod ai;
pub mod docs;
pub mod inbox;
pub mod lms;
pub mod videos;

pub use ai::{AiClient, AiError};
pub use docs::{DocsClient, DocsError, DocumentInfo, FolderMap};
pub use inbox::{Email, EmailPage, InboxClient, InboxError};
pub use lms::{AssignmentScope, LmsApi, LmsClient, LmsError};
pub use videos::{Video, VideoClient, VideoError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

/// Shown when a course has no listed teacher
pub const NOT_AVAILABLE: &str = "Not Available";
/// Shown when an assignment has no description
pub const NO_DESCRIPTION: &str = "No description available";
/// Shown when a submission has no grade yet
pub const NOT_GRADED: &str = "Not Graded";
/// Shown when a grade or percentage is missing
pub const NO_GRADE: &str = "N/A";

/// The built client, or a default one without the timeout if building failed
pub(crate) fn client_or_default(built: reqwest::Result<reqwest::Client>) -> reqwest::Client {
    built.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to build HTTP client, falling back to one without a timeout");
        reqwest::Client::new()
    })
}

/// Reads an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An active course the user is enrolled in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// Unique course identifier
    pub id: u64,
    /// Course name, e.g. "Biology 101"
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Academic term, when requested with `include[]=term`
    #[serde(default)]
    pub term: Option<Term>,
    /// Instructors, when requested with `include[]=teachers`
    #[serde(default, deserialize_with = "null_as_default")]
    pub teachers: Vec<Teacher>,
}

impl Course {
    /// Name of the first listed teacher
    pub fn professor(&self) -> Option<&str> {
        self.teachers
            .iter()
            .map(|t| t.display_name.as_str())
            .find(|name| !name.is_empty())
    }

    /// Term name or an empty string
    pub fn term_name(&self) -> &str {
        self.term
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
}

/// The user's submission for an assignment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Grade as the LMS reports it ("A", "92", "complete")
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

/// An assignment, tagged with the course it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Identifier, unique within the course
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub course_id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub submission: Option<Submission>,
    /// HTML description
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub submission_types: Vec<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Filled in from the owning course
    #[serde(default)]
    pub course_name: Option<String>,
}

impl Assignment {
    /// Tags the assignment with its course and fills in a missing link
    pub fn tagged(mut self, course: &Course, base_url: &str) -> Self {
        self.course_id = course.id;
        self.course_name = Some(course.name.clone());
        self.linked(base_url)
    }

    /// Derives `html_url` from the course and assignment ids when missing
    pub fn linked(mut self, base_url: &str) -> Self {
        if self.html_url.is_none() {
            self.html_url = Some(format!(
                "{}/courses/{}/assignments/{}",
                base_url, self.course_id, self.id
            ));
        }
        self
    }

    /// When the user submitted, if they have
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submission.as_ref().and_then(|s| s.submitted_at)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_at().is_some()
    }

    pub fn course_name(&self) -> &str {
        self.course_name.as_deref().unwrap_or("")
    }
}

/// Scores attached to an enrollment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentGrades {
    #[serde(default)]
    pub current_score: Option<f64>,
    #[serde(default)]
    pub final_score: Option<f64>,
    #[serde(default)]
    pub unposted_current_score: Option<f64>,
}

impl EnrollmentGrades {
    /// Current score, falling back to final then unposted
    pub fn best_score(&self) -> Option<f64> {
        self.current_score
            .or(self.final_score)
            .or(self.unposted_current_score)
    }
}

/// A course enrollment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    /// Enrollment type, e.g. "StudentEnrollment"
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub course_id: Option<u64>,
    #[serde(default)]
    pub grades: Option<EnrollmentGrades>,
}

impl Enrollment {
    pub fn is_student(&self) -> bool {
        self.kind == "StudentEnrollment"
    }
}

/// The authenticated user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    pub url: String,
}

/// Name and picture shown on the dashboard header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Whether an assignment has been turned in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Submitted,
    NotSubmitted,
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionStatus::Submitted => write!(f, "Submitted"),
            SubmissionStatus::NotSubmitted => write!(f, "Not Submitted"),
        }
    }
}

/// Everything the detail view shows for one assignment
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentDetails {
    pub course_id: u64,
    pub assignment_id: u64,
    pub title: String,
    pub professor: String,
    pub description: String,
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: Option<f64>,
    pub submission_types: Vec<String>,
    pub grade: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: SubmissionStatus,
}

impl AssignmentDetails {
    /// Combines an assignment with its course's professor, filling placeholders
    pub fn from_assignment(assignment: Assignment, professor: Option<&str>) -> Self {
        let submission = assignment.submission.clone().unwrap_or_default();
        let status = if submission.submitted_at.is_some() {
            SubmissionStatus::Submitted
        } else {
            SubmissionStatus::NotSubmitted
        };
        let title = if assignment.name.is_empty() {
            "Untitled Assignment".to_string()
        } else {
            assignment.name
        };

        Self {
            course_id: assignment.course_id,
            assignment_id: assignment.id,
            title,
            professor: professor.unwrap_or(NOT_AVAILABLE).to_string(),
            description: assignment
                .description
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            due_at: assignment.due_at,
            points_possible: assignment.points_possible,
            submission_types: assignment.submission_types,
            grade: submission.grade.unwrap_or_else(|| NOT_GRADED.to_string()),
            submitted_at: submission.submitted_at,
            status,
        }
    }
}

/// A graded or missed assignment whose due date has passed
#[derive(Debug, Clone, PartialEq)]
pub struct PastAssignment {
    pub id: u64,
    pub name: String,
    pub grade: String,
    pub submitted_at: Option<DateTime<Utc>>,
    pub due_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_course() -> Course {
        Course {
            id: 42,
            name: "Biology 101".to_string(),
            term: Some(Term {
                name: Some("Fall 2026".to_string()),
            }),
            teachers: vec![Teacher {
                display_name: "Dr. Rivera".to_string(),
            }],
        }
    }

    #[test]
    fn test_course_deserializes_from_lms_json() {
        let json = r#"{
            "id": 42,
            "name": "Biology 101",
            "term": {"id": 7, "name": "Fall 2026"},
            "teachers": [{"id": 9, "display_name": "Dr. Rivera"}],
            "enrollment_term_id": 7
        }"#;

        let course: Course = serde_json::from_str(json).unwrap();

        assert_eq!(course, sample_course());
        assert_eq!(course.professor(), Some("Dr. Rivera"));
        assert_eq!(course.term_name(), "Fall 2026");
    }

    #[test]
    fn test_course_without_teachers() {
        let course: Course = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(course.professor(), None);
        assert_eq!(course.term_name(), "");
    }

    #[test]
    fn test_assignment_deserializes_with_nulls() {
        let json = r#"{
            "id": 5,
            "name": "Lab Report",
            "due_at": null,
            "points_possible": null,
            "description": null,
            "submission_types": ["online_upload"]
        }"#;

        let assignment: Assignment = serde_json::from_str(json).unwrap();

        assert_eq!(assignment.id, 5);
        assert!(assignment.due_at.is_none());
        assert!(assignment.submission.is_none());
        assert!(!assignment.is_submitted());
    }

    #[tokio::test]
    async fn test_client_builder_failure_falls_back() {
        let built = reqwest::Client::builder()
            .user_agent("bad\nagent")
            .timeout(std::time::Duration::from_secs(30))
            .build();
        assert!(built.is_err());

        let client = client_or_default(built);
        let result = client.get("http://127.0.0.1:9/").send().await;

        assert!(result.is_err());
    }

    #[test]
    fn test_null_lists_and_names_read_as_empty() {
        let json = r#"[
            {"id": 1, "name": null, "submission_types": null, "course_id": null},
            {"id": 2, "name": "Quiz", "submission_types": ["online_quiz"]}
        ]"#;

        let assignments: Vec<Assignment> = serde_json::from_str(json).unwrap();

        assert_eq!(assignments.len(), 2);
        assert!(assignments[0].submission_types.is_empty());
        assert_eq!(assignments[0].name, "");
        assert_eq!(
            AssignmentDetails::from_assignment(assignments[0].clone(), None).title,
            "Untitled Assignment"
        );
        assert_eq!(assignments[1].submission_types, vec!["online_quiz".to_string()]);
    }

    #[test]
    fn test_null_teacher_name_is_skipped() {
        let json = r#"{
            "id": 3,
            "name": null,
            "teachers": [{"display_name": null}, {"display_name": "Dr. Okafor"}]
        }"#;

        let course: Course = serde_json::from_str(json).unwrap();

        assert_eq!(course.name, "");
        assert_eq!(course.professor(), Some("Dr. Okafor"));

        let course: Course = serde_json::from_str(r#"{"id": 4, "teachers": null}"#).unwrap();
        assert_eq!(course.professor(), None);
    }

    #[test]
    fn test_tagged_fills_course_and_url() {
        let assignment: Assignment =
            serde_json::from_str(r#"{"id": 5, "name": "Lab", "due_at": "2026-10-20T23:59:00Z"}"#)
                .unwrap();

        let tagged = assignment.tagged(&sample_course(), "https://school.instructure.com");

        assert_eq!(tagged.course_id, 42);
        assert_eq!(tagged.course_name(), "Biology 101");
        assert_eq!(
            tagged.html_url.as_deref(),
            Some("https://school.instructure.com/courses/42/assignments/5")
        );
        assert_eq!(
            tagged.due_at,
            Some(Utc.with_ymd_and_hms(2026, 10, 20, 23, 59, 0).unwrap())
        );
    }

    #[test]
    fn test_tagged_keeps_existing_url() {
        let assignment: Assignment =
            serde_json::from_str(r#"{"id": 5, "html_url": "https://lms/a/5"}"#).unwrap();

        let tagged = assignment.tagged(&sample_course(), "https://other");

        assert_eq!(tagged.html_url.as_deref(), Some("https://lms/a/5"));
    }

    #[test]
    fn test_best_score_fallback_order() {
        let grades = EnrollmentGrades {
            current_score: None,
            final_score: Some(81.0),
            unposted_current_score: Some(90.0),
        };
        assert_eq!(grades.best_score(), Some(81.0));

        let grades = EnrollmentGrades {
            unposted_current_score: Some(90.0),
            ..Default::default()
        };
        assert_eq!(grades.best_score(), Some(90.0));
        assert_eq!(EnrollmentGrades::default().best_score(), None);
    }

    #[test]
    fn test_enrollment_type_field() {
        let enrollment: Enrollment = serde_json::from_str(
            r#"{"type": "StudentEnrollment", "grades": {"current_score": 88.5}}"#,
        )
        .unwrap();

        assert!(enrollment.is_student());
        assert_eq!(enrollment.grades.and_then(|g| g.best_score()), Some(88.5));
    }

    #[test]
    fn test_details_placeholders() {
        let assignment: Assignment = serde_json::from_str(r#"{"id": 3, "course_id": 42}"#).unwrap();

        let details = AssignmentDetails::from_assignment(assignment, None);

        assert_eq!(details.title, "Untitled Assignment");
        assert_eq!(details.professor, NOT_AVAILABLE);
        assert_eq!(details.description, NO_DESCRIPTION);
        assert_eq!(details.grade, NOT_GRADED);
        assert_eq!(details.status, SubmissionStatus::NotSubmitted);
        assert_eq!(details.status.to_string(), "Not Submitted");
    }

    #[test]
    fn test_details_submitted() {
        let assignment: Assignment = serde_json::from_str(
            r#"{"id": 3, "name": "Essay", "submission": {"grade": "A-", "submitted_at": "2026-10-01T12:00:00Z"}}"#,
        )
        .unwrap();

        let details = AssignmentDetails::from_assignment(assignment, Some("Dr. Rivera"));

        assert_eq!(details.grade, "A-");
        assert_eq!(details.professor, "Dr. Rivera");
        assert_eq!(details.status.to_string(), "Submitted");
    }
}
