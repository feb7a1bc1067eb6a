//! One-shot subcommands
//!
//! Each subcommand runs against the configured services and produces plain
//! text for stdout. Service keys are checked only by the commands that use
//! them.

use std::io::{self, Read};
use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use crate::aggregator::{Aggregator, FetchOutcome, UpcomingAssignment};
use crate::cache::Clock;
use crate::cli::Command;
use crate::config::{Config, ConfigError};
use crate::data::docs::HomeworkOutcome;
use crate::data::{
    AiClient, AiError, Assignment, DocsClient, DocsError, DocumentInfo, EmailPage, FolderMap,
    InboxClient, InboxError, LmsApi, PastAssignment, Video, VideoClient, VideoError,
};
use crate::grades::{compute_gpa, GradeSnapshot};

/// Errors a subcommand can end with
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read input: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Video(#[from] VideoError),

    #[error(transparent)]
    Inbox(#[from] InboxError),

    #[error(transparent)]
    Docs(#[from] DocsError),

    /// An LMS lookup failed; carries the reason
    #[error("LMS request failed: {0}")]
    Lms(String),
}

/// Runs a subcommand and returns what it prints
///
/// # Arguments
/// * `command` - The parsed subcommand
/// * `config` - Runtime configuration, for service keys
/// * `aggregator` - LMS facade shared with the dashboard
/// * `now` - Reference time for past assignments and document dates
pub async fn run<A: LmsApi, C: Clock>(
    command: Command,
    config: &Config,
    aggregator: &Aggregator<A, C>,
    now: DateTime<Utc>,
) -> Result<String, CommandError> {
    info!(?command, "Running command");

    match command {
        Command::Summarize { file } => {
            let text = read_input(file.as_deref())?;
            let ai = AiClient::new(Config::require(&config.gemini_api_key, "GEMINI_API_KEY")?);
            Ok(ai.summarize_text(&text).await?)
        }
        Command::Ask { prompt } => {
            let ai = AiClient::new(Config::require(&config.gemini_api_key, "GEMINI_API_KEY")?);
            Ok(ai.generate(&prompt).await?)
        }
        Command::Videos { query, max } => {
            let videos =
                VideoClient::new(Config::require(&config.youtube_api_key, "YOUTUBE_API_KEY")?);
            Ok(format_videos(&videos.search(&query, max).await?))
        }
        Command::Inbox {
            sender,
            page,
            per_page,
        } => {
            let token = Config::require(&config.gmail_access_token, "GMAIL_ACCESS_TOKEN")?;
            let inbox = InboxClient::new(token, config.allowed_senders.clone());
            Ok(format_email_page(
                &inbox.emails_from_sender(&sender, page, per_page).await?,
            ))
        }
        Command::Grades => {
            let grades = expect_items(aggregator.classes_with_grades().await)?;
            Ok(format_grades(&grades))
        }
        Command::Assignments => {
            let mut assignments = expect_items(aggregator.list_all_assignments().await)?;
            assignments.sort_by_key(|a| (a.due_at.is_none(), a.due_at));
            Ok(format_assignments(&assignments))
        }
        Command::Past { course_id } => {
            let past = expect_items(aggregator.past_assignments(course_id, now).await)?;
            Ok(format_past(&past))
        }
        Command::HomeworkHelp {
            course_id,
            assignment_id,
        } => {
            let ai = AiClient::new(Config::require(&config.gemini_api_key, "GEMINI_API_KEY")?);
            let details = match aggregator.assignment_details(course_id, assignment_id).await {
                FetchOutcome::Found(details) => details,
                FetchOutcome::Empty => return Ok("Assignment not found".to_string()),
                FetchOutcome::Failed(reason) => return Err(CommandError::Lms(reason)),
            };
            let course_name = aggregator
                .list_courses()
                .await
                .into_items()
                .into_iter()
                .find(|c| c.id == course_id)
                .map(|c| c.name)
                .unwrap_or_default();
            Ok(ai
                .homework_help(&details.title, &course_name, &details.description)
                .await?)
        }
        Command::HwDoc { index, student } => {
            let docs = DocsClient::new(Config::require(
                &config.google_access_token,
                "GOOGLE_ACCESS_TOKEN",
            )?);
            let folders = FolderMap::load(&config.folder_ids_path).map_err(DocsError::from)?;
            let outcome = docs
                .create_homework_document(
                    aggregator,
                    &folders,
                    index,
                    student.as_deref(),
                    now.date_naive(),
                )
                .await?;
            Ok(match outcome {
                HomeworkOutcome::PendingSelection(upcoming) => format_upcoming(&upcoming),
                HomeworkOutcome::Created(info) => format_document(&info),
            })
        }
    }
}

/// Reads a file, or stdin when no path is given
fn read_input(path: Option<&Path>) -> Result<String, io::Error> {
    match path {
        Some(path) => std::fs::read_to_string(path),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Items of a list outcome; an empty result is not an error
fn expect_items<T>(outcome: FetchOutcome<Vec<T>>) -> Result<Vec<T>, CommandError> {
    match outcome {
        FetchOutcome::Failed(reason) => Err(CommandError::Lms(reason)),
        other => Ok(other.into_items()),
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_grades(grades: &[GradeSnapshot]) -> String {
    if grades.is_empty() {
        return "No grades available".to_string();
    }

    let mut out = String::new();
    for grade in grades {
        let percent = grade
            .percentage
            .map(|p| format!("{:.1}%", p))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<32} {:>7} {:>4}\n",
            grade.course_name, percent, grade.letter
        ));
    }
    match compute_gpa(grades.iter().map(|g| g.percentage)) {
        Some(gpa) => out.push_str(&format!("GPA: {:.2}", gpa)),
        None => out.push_str("GPA: unavailable"),
    }
    out
}

pub fn format_assignments(assignments: &[Assignment]) -> String {
    if assignments.is_empty() {
        return "No assignments".to_string();
    }

    assignments
        .iter()
        .map(|a| {
            let status = if a.is_submitted() { "submitted" } else { "open" };
            format!(
                "{}  {:<9}  {}  ({})",
                format_date(a.due_at),
                status,
                a.name,
                a.course_name()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_past(past: &[PastAssignment]) -> String {
    if past.is_empty() {
        return "No past assignments".to_string();
    }

    past.iter()
        .map(|p| {
            format!(
                "{}  {:<10}  {}  (submitted {})",
                format_date(Some(p.due_at)),
                p.grade,
                p.name,
                format_date(p.submitted_at)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_videos(videos: &[Video]) -> String {
    if videos.is_empty() {
        return "No videos found".to_string();
    }

    videos
        .iter()
        .map(|v| format!("{}\n  {}", v.title, v.url))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_email_page(page: &EmailPage) -> String {
    let mut out = format!(
        "Page {} of {} ({} emails)\n",
        page.page, page.total_pages, page.total
    );
    for email in &page.emails {
        out.push_str(&format!(
            "\n{}  {}\n  {}\n",
            format_date(email.received_at()),
            email.sender,
            email.subject
        ));
    }
    out.trim_end().to_string()
}

/// Numbered list for choosing an `--index`
pub fn format_upcoming(upcoming: &[UpcomingAssignment]) -> String {
    let mut out = String::from("Upcoming assignments (choose one with --index):\n");
    for (index, item) in upcoming.iter().enumerate() {
        out.push_str(&format!(
            "  [{}] {} ({}) due {}\n",
            index,
            item.assignment.name,
            item.course.name,
            format_date(item.assignment.due_at)
        ));
    }
    out.trim_end().to_string()
}

pub fn format_document(info: &DocumentInfo) -> String {
    format!(
        "Created \"{}\" for {}\n{}",
        info.assignment_name, info.course_name, info.url
    )
}
