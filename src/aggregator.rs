//! Course and assignment aggregation
//!
//! Merges per-course LMS data into the flat views the dashboard needs and
//! serves the expensive ones from a shared TTL cache. Every operation
//! reports a `FetchOutcome`: upstream failures are logged and returned as
//! `Failed`, never propagated.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{Clock, ResponseCache, SystemClock};
use crate::data::{
    Assignment, AssignmentDetails, AssignmentScope, Course, LmsApi, PastAssignment, UserProfile,
    NO_GRADE,
};
use crate::grades::{academic_year, compute_gpa, AcademicYear, GradeSnapshot};

/// Cache key for the active course list
pub const CLASSES_KEY: &str = "classes";
/// Cache key for the flattened assignment list
pub const ALL_ASSIGNMENTS_KEY: &str = "all_assignments";

/// Result of an aggregated lookup
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    /// Data was returned
    Found(T),
    /// The call succeeded but there was nothing to return
    Empty,
    /// The upstream call failed; carries the reason
    Failed(String),
}

impl<T> FetchOutcome<T> {
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => FetchOutcome::Found(v),
            None => FetchOutcome::Empty,
        }
    }

    /// The value, or `None` for `Empty` and `Failed`
    pub fn into_option(self) -> Option<T> {
        match self {
            FetchOutcome::Found(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Found(v) => FetchOutcome::Found(f(v)),
            FetchOutcome::Empty => FetchOutcome::Empty,
            FetchOutcome::Failed(reason) => FetchOutcome::Failed(reason),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed(_))
    }

    /// The failure reason, if the call failed
    pub fn failure(&self) -> Option<&str> {
        match self {
            FetchOutcome::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl<T> FetchOutcome<Vec<T>> {
    /// `Found` for a non-empty list, `Empty` otherwise
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            FetchOutcome::Empty
        } else {
            FetchOutcome::Found(items)
        }
    }

    /// The items, or an empty list for `Empty` and `Failed`
    pub fn into_items(self) -> Vec<T> {
        self.into_option().unwrap_or_default()
    }

    pub fn items(&self) -> &[T] {
        match self {
            FetchOutcome::Found(items) => items,
            _ => &[],
        }
    }
}

/// An upcoming assignment together with its course
#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingAssignment {
    pub course: Course,
    pub assignment: Assignment,
}

/// Aggregation facade over an LMS API and a response cache
pub struct Aggregator<A, C: Clock = SystemClock> {
    api: A,
    cache: Arc<ResponseCache<C>>,
}

impl<A: LmsApi, C: Clock> Aggregator<A, C> {
    pub fn new(api: A, cache: Arc<ResponseCache<C>>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &Arc<ResponseCache<C>> {
        &self.cache
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Reads a non-empty cached list
    fn cached_items<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        let items: Vec<T> = self.cache.get(key)?;
        if items.is_empty() {
            return None;
        }
        debug!(key, count = items.len(), "Cache hit");
        Some(items)
    }

    /// Stores a list only when it has items
    fn store_items<T: Serialize>(&self, key: &str, items: &[T]) {
        if items.is_empty() {
            return;
        }
        if let Err(e) = self.cache.set(key, &items) {
            warn!(key, error = %e, "Failed to cache response");
        }
    }

    /// Active courses, cached under `"classes"`
    pub async fn list_courses(&self) -> FetchOutcome<Vec<Course>> {
        if let Some(courses) = self.cached_items(CLASSES_KEY) {
            return FetchOutcome::Found(courses);
        }

        match self.api.courses().await {
            Ok(courses) => {
                info!(count = courses.len(), "Fetched courses");
                self.store_items(CLASSES_KEY, &courses);
                FetchOutcome::from_items(courses)
            }
            Err(e) => {
                warn!(error = %e, "Error fetching courses");
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    /// One course's assignments with submissions, uncached
    pub async fn list_assignments_for_course(&self, course_id: u64) -> FetchOutcome<Vec<Assignment>> {
        self.course_assignments(course_id, AssignmentScope::All).await
    }

    /// One course's upcoming assignments ordered by due date, uncached
    pub async fn list_upcoming_assignments(&self, course_id: u64) -> FetchOutcome<Vec<Assignment>> {
        self.course_assignments(course_id, AssignmentScope::Upcoming).await
    }

    async fn course_assignments(
        &self,
        course_id: u64,
        scope: AssignmentScope,
    ) -> FetchOutcome<Vec<Assignment>> {
        match self.api.assignments(course_id, scope).await {
            Ok(assignments) => {
                let base_url = self.api.base_url();
                FetchOutcome::from_items(
                    assignments
                        .into_iter()
                        .map(|a| {
                            let a = if a.course_id == 0 {
                                Assignment { course_id, ..a }
                            } else {
                                a
                            };
                            a.linked(base_url)
                        })
                        .collect(),
                )
            }
            Err(e) => {
                warn!(course_id, error = %e, "Error fetching assignments");
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    /// Every assignment of every active course, tagged with its course
    ///
    /// Courses are fetched concurrently; the result keeps course order. A
    /// failure in any course fails the whole list. Cached under
    /// `"all_assignments"`.
    pub async fn list_all_assignments(&self) -> FetchOutcome<Vec<Assignment>> {
        if let Some(assignments) = self.cached_items(ALL_ASSIGNMENTS_KEY) {
            return FetchOutcome::Found(assignments);
        }

        let courses = match self.list_courses().await {
            FetchOutcome::Found(courses) => courses,
            FetchOutcome::Empty => return FetchOutcome::Empty,
            FetchOutcome::Failed(reason) => return FetchOutcome::Failed(reason),
        };

        let results = join_all(
            courses
                .iter()
                .map(|course| self.api.assignments(course.id, AssignmentScope::All)),
        )
        .await;

        let base_url = self.api.base_url();
        let mut all = Vec::new();
        for (course, result) in courses.iter().zip(results) {
            match result {
                Ok(assignments) => {
                    all.extend(assignments.into_iter().map(|a| a.tagged(course, base_url)));
                }
                Err(e) => {
                    warn!(course_id = course.id, error = %e, "Error fetching all assignments");
                    return FetchOutcome::Failed(e.to_string());
                }
            }
        }

        info!(courses = courses.len(), count = all.len(), "Fetched all assignments");
        self.store_items(ALL_ASSIGNMENTS_KEY, &all);
        FetchOutcome::from_items(all)
    }

    /// Upcoming assignments across courses, in course order
    ///
    /// A course whose request fails contributes nothing.
    pub async fn upcoming_across_courses(&self) -> FetchOutcome<Vec<UpcomingAssignment>> {
        let courses = match self.list_courses().await {
            FetchOutcome::Found(courses) => courses,
            FetchOutcome::Empty => return FetchOutcome::Empty,
            FetchOutcome::Failed(reason) => return FetchOutcome::Failed(reason),
        };

        let results = join_all(
            courses
                .iter()
                .map(|course| self.api.assignments(course.id, AssignmentScope::Upcoming)),
        )
        .await;

        let base_url = self.api.base_url();
        let mut upcoming = Vec::new();
        for (course, result) in courses.iter().zip(results) {
            match result {
                Ok(assignments) => upcoming.extend(assignments.into_iter().map(|a| {
                    UpcomingAssignment {
                        course: course.clone(),
                        assignment: a.tagged(course, base_url),
                    }
                })),
                Err(e) => warn!(course_id = course.id, error = %e, "Skipping course"),
            }
        }
        FetchOutcome::from_items(upcoming)
    }

    /// The user's display name
    pub async fn user_name(&self) -> FetchOutcome<String> {
        match self.api.current_user().await {
            Ok(user) => FetchOutcome::from_option(user.name),
            Err(e) => {
                warn!(error = %e, "Error getting user name");
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    /// URL of the user's first avatar
    pub async fn avatar_url(&self) -> FetchOutcome<String> {
        match self.api.avatars().await {
            Ok(avatars) => FetchOutcome::from_option(avatars.into_iter().next().map(|a| a.url)),
            Err(e) => {
                warn!(error = %e, "Error fetching profile picture");
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    /// Name and avatar, fetched together
    pub async fn profile(&self) -> UserProfile {
        let (name, avatar_url) = futures::join!(self.user_name(), self.avatar_url());
        UserProfile {
            name: name.into_option(),
            avatar_url: avatar_url.into_option(),
        }
    }

    /// Current percentage in a course
    ///
    /// Uses the first student enrollment, preferring the current score and
    /// falling back to the final then unposted score.
    pub async fn course_grade(&self, course_id: u64) -> FetchOutcome<f64> {
        match self.api.course_enrollments(course_id).await {
            Ok(enrollments) => FetchOutcome::from_option(
                enrollments
                    .into_iter()
                    .find(|e| e.is_student())
                    .and_then(|e| e.grades)
                    .and_then(|g| g.best_score()),
            ),
            Err(e) => {
                warn!(course_id, error = %e, "Error fetching grades");
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    /// A grade snapshot per course, in course order
    ///
    /// Courses without a grade are kept with a `"N/A"` letter.
    pub async fn classes_with_grades(&self) -> FetchOutcome<Vec<GradeSnapshot>> {
        let courses = match self.list_courses().await {
            FetchOutcome::Found(courses) => courses,
            FetchOutcome::Empty => return FetchOutcome::Empty,
            FetchOutcome::Failed(reason) => return FetchOutcome::Failed(reason),
        };

        let grades = join_all(courses.iter().map(|c| self.course_grade(c.id))).await;

        FetchOutcome::from_items(
            courses
                .iter()
                .zip(grades)
                .map(|(course, grade)| GradeSnapshot::new(course.id, &course.name, grade.into_option()))
                .collect(),
        )
    }

    /// GPA over every graded course
    pub async fn gpa(&self) -> FetchOutcome<f64> {
        match self.classes_with_grades().await {
            FetchOutcome::Found(snapshots) => {
                FetchOutcome::from_option(compute_gpa(snapshots.iter().map(|s| s.percentage)))
            }
            FetchOutcome::Empty => FetchOutcome::Empty,
            FetchOutcome::Failed(reason) => FetchOutcome::Failed(reason),
        }
    }

    /// Assignments due before `now`, most recently submitted first
    ///
    /// Unsubmitted assignments sort last.
    pub async fn past_assignments(
        &self,
        course_id: u64,
        now: DateTime<Utc>,
    ) -> FetchOutcome<Vec<PastAssignment>> {
        let assignments = match self.api.assignments(course_id, AssignmentScope::ByDueDate).await {
            Ok(assignments) => assignments,
            Err(e) => {
                warn!(course_id, error = %e, "Error fetching past assignments");
                return FetchOutcome::Failed(e.to_string());
            }
        };

        let mut past: Vec<PastAssignment> = assignments
            .into_iter()
            .filter_map(|a| {
                let due_at = a.due_at.filter(|due| *due < now)?;
                let submission = a.submission.unwrap_or_default();
                Some(PastAssignment {
                    id: a.id,
                    name: a.name,
                    grade: submission.grade.unwrap_or_else(|| NO_GRADE.to_string()),
                    submitted_at: submission.submitted_at,
                    due_at,
                })
            })
            .collect();

        // None orders before Some, so descending puts unsubmitted last
        past.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        FetchOutcome::from_items(past)
    }

    /// Full details for one assignment
    pub async fn assignment_details(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> FetchOutcome<AssignmentDetails> {
        let assignment = match self.api.assignment(course_id, assignment_id).await {
            Ok(assignment) => assignment,
            Err(e) => {
                warn!(course_id, assignment_id, error = %e, "Error getting assignment details");
                return FetchOutcome::Failed(e.to_string());
            }
        };

        let courses = self.list_courses().await.into_items();
        let professor = courses
            .iter()
            .find(|c| c.id == course_id)
            .and_then(Course::professor);

        let assignment = Assignment {
            course_id,
            ..assignment
        };
        FetchOutcome::Found(AssignmentDetails::from_assignment(assignment, professor))
    }

    /// Class standing from credits earned across enrollments
    pub async fn academic_year(&self) -> FetchOutcome<AcademicYear> {
        match self.api.self_enrollments().await {
            Ok(enrollments) => FetchOutcome::Found(academic_year(
                enrollments
                    .iter()
                    .map(|e| e.grades.as_ref().and_then(|g| g.final_score)),
            )),
            Err(e) => {
                warn!(error = %e, "Error determining year");
                FetchOutcome::Failed(e.to_string())
            }
        }
    }
}
