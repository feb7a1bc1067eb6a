//! Documents and drive API client
//!
//! Creates homework documents with an MLA-style heading and files them into
//! per-class folders. Uses an already-issued bearer token.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

use crate::aggregator::{Aggregator, FetchOutcome, UpcomingAssignment};
use crate::cache::Clock;

use super::{LmsApi, NOT_AVAILABLE};

/// Base URL for the documents API
const DOCS_BASE_URL: &str = "https://docs.googleapis.com/v1/documents";

/// Base URL for the drive files API
const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3/files";

const FONT_FAMILY: &str = "Times New Roman";
const FONT_SIZE_PT: u32 = 12;
/// Double spacing, in percent
const LINE_SPACING: u32 = 200;

/// Errors that can occur while creating documents
#[derive(Debug, Error)]
pub enum DocsError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("{endpoint} returned status {status}")]
    Status { status: u16, endpoint: String },

    /// The folder mapping could not be read
    #[error("Failed to read folder mapping: {0}")]
    FolderMap(#[from] csv::Error),

    /// No folder is mapped for the class
    #[error("Could not find folder ID for class {0}")]
    FolderNotFound(String),

    /// The header created for the document is missing
    #[error("Document {0} has no header")]
    MissingHeader(String),

    #[error("Could not get student name from the LMS")]
    StudentNameUnavailable,

    #[error("No upcoming assignments found")]
    NoAssignments,

    #[error("Assignment index {index} out of range (0..{count})")]
    InvalidSelection { index: usize, count: usize },
}

/// A created homework document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub document_id: String,
    pub assignment_name: String,
    pub course_name: String,
    pub url: String,
}

/// Result of the homework document workflow
#[derive(Debug, Clone, PartialEq)]
pub enum HomeworkOutcome {
    /// No index given; these are the choices, indexed by position
    PendingSelection(Vec<UpcomingAssignment>),
    Created(DocumentInfo),
}

/// Editing URL for a document
pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{}/edit", document_id)
}

#[derive(Debug, Deserialize)]
struct FolderRow {
    #[serde(rename = "Folder Name")]
    name: String,
    #[serde(rename = "Folder ID")]
    id: String,
}

/// Class name to drive folder id mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FolderMap {
    folders: HashMap<String, String>,
}

impl FolderMap {
    /// Loads a CSV with `Folder Name` and `Folder ID` columns
    pub fn load(path: &Path) -> Result<Self, csv::Error> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut folders = HashMap::new();
        for row in reader.deserialize() {
            let row: FolderRow = row?;
            folders.entry(row.name).or_insert(row.id);
        }
        Ok(Self { folders })
    }

    pub fn folder_id(&self, class_name: &str) -> Option<&str> {
        self.folders.get(class_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }
}

/// Length in UTF-16 code units, the unit of document indices
fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Builds the heading edits for a new document
///
/// Adds a right-aligned `"{last name} 1"` page header and the
/// name/professor/class/date block in 12pt Times New Roman, double spaced.
pub fn heading_requests(
    header_id: &str,
    student_name: &str,
    professor: &str,
    class_name: &str,
    date: NaiveDate,
) -> Vec<Value> {
    let last_name = student_name.split_whitespace().last().unwrap_or(student_name);
    let header_text = format!("{} 1", last_name);
    let date_text = date.format("%d %B %Y").to_string();
    let body_text = format!(
        "{}\n{}\n{}\n{}\n\n",
        student_name, professor, class_name, date_text
    );
    // Covers the four heading lines and the newlines between them
    let body_end = 1
        + utf16_len(student_name)
        + utf16_len(professor)
        + utf16_len(class_name)
        + utf16_len(&date_text)
        + 4;

    vec![
        json!({
            "insertText": {
                "location": {"segmentId": header_id, "index": 0},
                "text": header_text,
            }
        }),
        json!({
            "updateParagraphStyle": {
                "range": {
                    "segmentId": header_id,
                    "startIndex": 0,
                    "endIndex": utf16_len(&header_text),
                },
                "paragraphStyle": {"alignment": "END"},
                "fields": "alignment",
            }
        }),
        json!({
            "insertText": {
                "location": {"index": 1},
                "text": body_text,
            }
        }),
        json!({
            "updateTextStyle": {
                "range": {"startIndex": 1, "endIndex": body_end},
                "textStyle": {
                    "fontSize": {"magnitude": FONT_SIZE_PT, "unit": "PT"},
                    "weightedFontFamily": {"fontFamily": FONT_FAMILY},
                },
                "fields": "fontSize,weightedFontFamily",
            }
        }),
        json!({
            "updateParagraphStyle": {
                "range": {"startIndex": 1, "endIndex": body_end},
                "paragraphStyle": {"lineSpacing": LINE_SPACING, "alignment": "START"},
                "fields": "lineSpacing,alignment",
            }
        }),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedDocument {
    document_id: String,
}

/// The parts of a document this client reads
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    /// Header id to header content
    #[serde(default)]
    pub headers: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    #[serde(default)]
    parents: Vec<String>,
}

/// Client for the documents and drive APIs
#[derive(Debug, Clone)]
pub struct DocsClient {
    client: Client,
    token: String,
    docs_url: String,
    drive_url: String,
}

impl DocsClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            docs_url: DOCS_BASE_URL.to_string(),
            drive_url: DRIVE_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_urls(mut self, docs_url: impl Into<String>, drive_url: impl Into<String>) -> Self {
        self.docs_url = docs_url.into();
        self.drive_url = drive_url.into();
        self
    }

    async fn check(response: reqwest::Response, endpoint: &str) -> Result<reqwest::Response, DocsError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(DocsError::Status {
                status: response.status().as_u16(),
                endpoint: endpoint.to_string(),
            })
        }
    }

    /// Creates an empty document and returns its id
    pub async fn create_document(&self, title: &str) -> Result<String, DocsError> {
        let response = self
            .client
            .post(&self.docs_url)
            .bearer_auth(&self.token)
            .json(&json!({ "title": title }))
            .send()
            .await?;
        let created: CreatedDocument = Self::check(response, "documents.create").await?.json().await?;

        info!(title, document_id = %created.document_id, "Created document");
        Ok(created.document_id)
    }

    /// Applies a batch of edit requests
    pub async fn batch_update(&self, document_id: &str, requests: Vec<Value>) -> Result<Value, DocsError> {
        let url = format!("{}/{}:batchUpdate", self.docs_url, document_id);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "requests": requests }))
            .send()
            .await?;

        Ok(Self::check(response, "documents.batchUpdate").await?.json().await?)
    }

    pub async fn get_document(&self, document_id: &str) -> Result<Document, DocsError> {
        let url = format!("{}/{}", self.docs_url, document_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        Ok(Self::check(response, "documents.get").await?.json().await?)
    }

    /// Moves a file out of its current parents into `folder_id`
    pub async fn move_to_folder(&self, file_id: &str, folder_id: &str) -> Result<(), DocsError> {
        let url = format!("{}/{}", self.drive_url, file_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("fields", "parents")])
            .send()
            .await?;
        let file: DriveFile = Self::check(response, "files.get").await?.json().await?;
        let previous_parents = file.parents.join(",");

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("addParents", folder_id),
                ("removeParents", previous_parents.as_str()),
                ("fields", "id, parents"),
            ])
            .json(&json!({}))
            .send()
            .await?;
        Self::check(response, "files.update").await?;
        Ok(())
    }

    /// Adds a page header and the heading block to a fresh document
    pub async fn apply_heading(
        &self,
        document_id: &str,
        student_name: &str,
        professor: &str,
        class_name: &str,
        date: NaiveDate,
    ) -> Result<(), DocsError> {
        self.batch_update(
            document_id,
            vec![json!({ "createHeader": { "type": "DEFAULT" } })],
        )
        .await?;

        let document = self.get_document(document_id).await?;
        let header_id = document
            .headers
            .keys()
            .next()
            .cloned()
            .ok_or_else(|| DocsError::MissingHeader(document_id.to_string()))?;

        self.batch_update(
            document_id,
            heading_requests(&header_id, student_name, professor, class_name, date),
        )
        .await?;
        Ok(())
    }

    /// Creates a headed homework document for an upcoming assignment
    ///
    /// # Arguments
    /// * `aggregator` - Source of the student name and upcoming assignments
    /// * `folders` - Class name to folder mapping
    /// * `index` - Position in the upcoming list; `None` returns the list
    /// * `student_name` - Overrides the LMS profile name
    /// * `today` - Date written into the heading
    pub async fn create_homework_document<A: LmsApi, C: Clock>(
        &self,
        aggregator: &Aggregator<A, C>,
        folders: &FolderMap,
        index: Option<usize>,
        student_name: Option<&str>,
        today: NaiveDate,
    ) -> Result<HomeworkOutcome, DocsError> {
        let upcoming = match aggregator.upcoming_across_courses().await {
            FetchOutcome::Found(list) => list,
            _ => return Err(DocsError::NoAssignments),
        };

        let Some(index) = index else {
            return Ok(HomeworkOutcome::PendingSelection(upcoming));
        };

        let count = upcoming.len();
        let selected = upcoming
            .into_iter()
            .nth(index)
            .ok_or(DocsError::InvalidSelection { index, count })?;

        let student_name = match student_name {
            Some(name) => name.to_string(),
            None => aggregator
                .user_name()
                .await
                .into_option()
                .ok_or(DocsError::StudentNameUnavailable)?,
        };

        let course_name = selected.course.name.clone();
        let folder_id = folders
            .folder_id(&course_name)
            .ok_or_else(|| DocsError::FolderNotFound(course_name.clone()))?;
        let professor = selected.course.professor().unwrap_or(NOT_AVAILABLE);

        let document_id = self.create_document(&selected.assignment.name).await?;
        self.apply_heading(&document_id, &student_name, professor, &course_name, today)
            .await?;
        self.move_to_folder(&document_id, folder_id).await?;

        Ok(HomeworkOutcome::Created(DocumentInfo {
            url: document_url(&document_id),
            document_id,
            assignment_name: selected.assignment.name,
            course_name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::tests::{populated_lms, FakeLms};
    use crate::cache::ResponseCache;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    #[test]
    fn test_heading_header_uses_last_name() {
        let requests = heading_requests("kix.h1", "Jordan Lee", "Dr. Rivera", "Biology", date());

        assert_eq!(requests.len(), 5);
        assert_eq!(requests[0]["insertText"]["text"], "Lee 1");
        assert_eq!(requests[0]["insertText"]["location"]["segmentId"], "kix.h1");
        assert_eq!(requests[1]["updateParagraphStyle"]["range"]["endIndex"], 5);
        assert_eq!(requests[1]["updateParagraphStyle"]["paragraphStyle"]["alignment"], "END");
    }

    #[test]
    fn test_heading_body_text_and_range() {
        let requests = heading_requests("h", "Jordan Lee", "Dr. Rivera", "Biology", date());

        assert_eq!(
            requests[2]["insertText"]["text"],
            "Jordan Lee\nDr. Rivera\nBiology\n19 October 2026\n\n"
        );
        // 1 + 10 + 10 + 7 + 15 + 4
        assert_eq!(requests[3]["updateTextStyle"]["range"]["endIndex"], 47);
        assert_eq!(
            requests[3]["updateTextStyle"]["textStyle"]["weightedFontFamily"]["fontFamily"],
            "Times New Roman"
        );
        assert_eq!(requests[4]["updateParagraphStyle"]["paragraphStyle"]["lineSpacing"], 200);
    }

    #[test]
    fn test_heading_counts_utf16_units() {
        let requests = heading_requests("h", "Zoë 🎓", "P", "C", date());

        // "🎓" is two UTF-16 units
        assert_eq!(requests[1]["updateParagraphStyle"]["range"]["endIndex"], 4);
        assert_eq!(requests[0]["insertText"]["text"], "🎓 1");
    }

    #[test]
    fn test_folder_map_loads_csv() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("Folder_Ids.csv");
        fs::write(
            &path,
            "\"Folder Name\",\"Folder ID\"\n\"Biology\",\"f-bio\"\n\"Chemistry\",\"f-chem\"\n\"Biology\",\"f-dup\"\n",
        )
        .unwrap();

        let folders = FolderMap::load(&path).unwrap();

        assert_eq!(folders.len(), 2);
        assert_eq!(folders.folder_id("Biology"), Some("f-bio"));
        assert_eq!(folders.folder_id("History"), None);
    }

    #[test]
    fn test_folder_map_missing_file_is_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        assert!(FolderMap::load(&temp_dir.path().join("missing.csv")).is_err());
    }

    #[test]
    fn test_document_url() {
        assert_eq!(document_url("abc"), "https://docs.google.com/document/d/abc/edit");
    }

    fn aggregator(lms: FakeLms) -> Aggregator<FakeLms> {
        Aggregator::new(lms, Arc::new(ResponseCache::with_default_ttl()))
    }

    fn offline_client() -> DocsClient {
        DocsClient::new("token").with_base_urls("http://127.0.0.1:9/docs", "http://127.0.0.1:9/drive")
    }

    #[tokio::test]
    async fn test_homework_without_index_lists_choices() {
        let agg = aggregator(populated_lms());

        let outcome = offline_client()
            .create_homework_document(&agg, &FolderMap::default(), None, None, date())
            .await
            .unwrap();

        match outcome {
            HomeworkOutcome::PendingSelection(choices) => {
                assert_eq!(choices.len(), 6);
                assert_eq!(choices[0].assignment.name, "Homework 1");
            }
            other => panic!("Expected selection list, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_homework_index_out_of_range() {
        let agg = aggregator(populated_lms());

        let result = offline_client()
            .create_homework_document(&agg, &FolderMap::default(), Some(6), Some("Jordan Lee"), date())
            .await;

        assert!(matches!(result, Err(DocsError::InvalidSelection { index: 6, count: 6 })));
    }

    #[tokio::test]
    async fn test_homework_unmapped_class_fails_before_any_request() {
        let agg = aggregator(populated_lms());

        let result = offline_client()
            .create_homework_document(&agg, &FolderMap::default(), Some(0), None, date())
            .await;

        assert!(matches!(result, Err(DocsError::FolderNotFound(name)) if name == "Biology"));
    }
}
