//! LMS REST API client
//!
//! Thin authenticated wrapper over the course, assignment, enrollment and
//! user endpoints. Every call is a single GET with a bearer token; failures
//! surface as `LmsError` and are never retried.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use super::{client_or_default, Assignment, Avatar, Course, CurrentUser, Enrollment};

/// Per-request timeout for LMS calls
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Page size requested on list endpoints
const PER_PAGE: &str = "100";

/// Errors that can occur when talking to the LMS
#[derive(Debug, Error)]
pub enum LmsError {
    /// HTTP request failed or the body could not be decoded
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The LMS answered with a non-success status
    #[error("{endpoint} returned status {status}")]
    Status { status: u16, endpoint: String },
}

/// Which assignments of a course to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentScope {
    /// Every assignment, with the user's submission
    All,
    /// Only upcoming assignments, ordered by due date
    Upcoming,
    /// Every assignment, ordered by due date
    ByDueDate,
}

impl AssignmentScope {
    fn query(self) -> Vec<(&'static str, &'static str)> {
        let mut params = vec![("include[]", "submission"), ("per_page", PER_PAGE)];
        match self {
            AssignmentScope::All => {}
            AssignmentScope::Upcoming => {
                params.push(("bucket", "upcoming"));
                params.push(("order_by", "due_at"));
            }
            AssignmentScope::ByDueDate => params.push(("order_by", "due_at")),
        }
        params
    }
}

/// The LMS calls the aggregation layer depends on
///
/// Implemented by `LmsClient` over HTTP; tests substitute an in-memory fake.
#[allow(async_fn_in_trait)]
pub trait LmsApi {
    /// Normalized base URL, used to build assignment links
    fn base_url(&self) -> &str;

    /// Active courses with term and teachers
    async fn courses(&self) -> Result<Vec<Course>, LmsError>;

    /// Assignments of one course
    async fn assignments(
        &self,
        course_id: u64,
        scope: AssignmentScope,
    ) -> Result<Vec<Assignment>, LmsError>;

    /// A single assignment
    async fn assignment(&self, course_id: u64, assignment_id: u64)
        -> Result<Assignment, LmsError>;

    /// The user's student enrollments in one course, with scores
    async fn course_enrollments(&self, course_id: u64) -> Result<Vec<Enrollment>, LmsError>;

    /// All of the user's enrollments
    async fn self_enrollments(&self) -> Result<Vec<Enrollment>, LmsError>;

    async fn current_user(&self) -> Result<CurrentUser, LmsError>;

    async fn avatars(&self) -> Result<Vec<Avatar>, LmsError>;
}

/// HTTP client for the LMS REST API
#[derive(Debug, Clone)]
pub struct LmsClient {
    client: Client,
    base_url: String,
    token: String,
}

impl LmsClient {
    /// Creates a client for `base_url` (already normalized) using `token`
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let client = client_or_default(
            Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build(),
        );
        Self::with_client(client, base_url, token)
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Issues an authenticated GET against `/api/v1/{path}` and decodes the body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, LmsError> {
        let url = format!("{}/api/v1/{}", self.base_url, path);
        debug!(%url, "LMS request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LmsError::Status {
                status: response.status().as_u16(),
                endpoint: path.to_string(),
            });
        }

        Ok(response.json::<T>().await?)
    }
}

impl LmsApi for LmsClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn courses(&self) -> Result<Vec<Course>, LmsError> {
        self.get_json(
            "courses",
            &[
                ("enrollment_state", "active"),
                ("include[]", "term"),
                ("include[]", "teachers"),
                ("per_page", PER_PAGE),
            ],
        )
        .await
    }

    async fn assignments(
        &self,
        course_id: u64,
        scope: AssignmentScope,
    ) -> Result<Vec<Assignment>, LmsError> {
        let path = format!("courses/{}/assignments", course_id);
        self.get_json(&path, &scope.query()).await
    }

    async fn assignment(
        &self,
        course_id: u64,
        assignment_id: u64,
    ) -> Result<Assignment, LmsError> {
        let path = format!("courses/{}/assignments/{}", course_id, assignment_id);
        self.get_json(&path, &[("include[]", "submission")]).await
    }

    async fn course_enrollments(&self, course_id: u64) -> Result<Vec<Enrollment>, LmsError> {
        let path = format!("courses/{}/enrollments", course_id);
        self.get_json(
            &path,
            &[
                ("type[]", "StudentEnrollment"),
                ("user_id", "self"),
                ("include[]", "current_grade"),
                ("include[]", "current_score"),
                ("per_page", PER_PAGE),
            ],
        )
        .await
    }

    async fn self_enrollments(&self) -> Result<Vec<Enrollment>, LmsError> {
        self.get_json("users/self/enrollments", &[("per_page", PER_PAGE)])
            .await
    }

    async fn current_user(&self) -> Result<CurrentUser, LmsError> {
        self.get_json("users/self", &[]).await
    }

    async fn avatars(&self) -> Result<Vec<Avatar>, LmsError> {
        self.get_json("users/self/avatars", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upcoming_scope_query() {
        let query = AssignmentScope::Upcoming.query();
        assert!(query.contains(&("bucket", "upcoming")));
        assert!(query.contains(&("order_by", "due_at")));
        assert!(query.contains(&("include[]", "submission")));
    }

    #[test]
    fn test_all_scope_has_no_bucket() {
        let query = AssignmentScope::All.query();
        assert!(!query.iter().any(|(k, _)| *k == "bucket" || *k == "order_by"));
        assert!(query.contains(&("per_page", "100")));
    }

    #[test]
    fn test_client_keeps_base_url() {
        let client = LmsClient::new("https://school.instructure.com", "token");
        assert_eq!(client.base_url(), "https://school.instructure.com");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        // Port 9 on localhost is the discard service and is normally closed.
        let client = LmsClient::new("http://127.0.0.1:9", "token");

        let result = client.courses().await;

        assert!(matches!(result, Err(LmsError::RequestFailed(_))));
    }
}
