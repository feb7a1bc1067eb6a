//! Command-line interface parsing for Student Hub
//!
//! With no subcommand the dashboard opens, optionally on a chosen view.
//! Subcommands run one task against the configured services and print the
//! result.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::data::inbox::{ALL_SENDERS, DEFAULT_PER_PAGE};
use crate::data::videos::DEFAULT_MAX_RESULTS;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified view name is not recognized
    #[error("Invalid view: '{0}'. Valid views: dashboard, assignments, grades")]
    InvalidView(String),
}

/// Student Hub - courses, assignments, grades and study tools in the terminal
#[derive(Parser, Debug)]
#[command(name = "studenthub")]
#[command(about = "Student dashboard for courses, assignments and grades")]
#[command(version)]
pub struct Cli {
    /// Open the dashboard on a specific view
    ///
    /// Valid views: dashboard, assignments, grades
    #[arg(long, value_name = "VIEW")]
    pub view: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// One-shot tasks
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Summarize text from a file, or stdin when no file is given
    Summarize {
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
    /// Ask the AI model a question
    Ask {
        prompt: String,
    },
    /// Recommend videos for a topic
    Videos {
        query: String,
        #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
        max: u32,
    },
    /// List mail from allowed senders
    Inbox {
        /// An allowed sender address, or "all"
        #[arg(long, default_value = ALL_SENDERS)]
        sender: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PER_PAGE)]
        per_page: usize,
    },
    /// Print grades per class and the overall GPA
    Grades,
    /// Print all assignments ordered by due date
    Assignments,
    /// Print a course's past assignments, most recently submitted first
    Past {
        course_id: u64,
    },
    /// Ask the AI model for help with one assignment
    HomeworkHelp {
        course_id: u64,
        assignment_id: u64,
    },
    /// Create a homework document for an upcoming assignment
    ///
    /// Without --index, lists the upcoming assignments to choose from.
    HwDoc {
        #[arg(long)]
        index: Option<usize>,
        /// Name for the heading; defaults to the LMS profile name
        #[arg(long)]
        student: Option<String>,
    },
}

/// Dashboard views selectable at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Dashboard,
    Assignments,
    Grades,
}

impl View {
    /// Parses a view name, case-insensitively
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" | "home" => Some(View::Dashboard),
            "assignments" | "todo" => Some(View::Assignments),
            "grades" => Some(View::Grades),
            _ => None,
        }
    }
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    /// View shown once data has loaded
    pub initial_view: View,
}

/// Parses a view string argument into a View.
///
/// # Arguments
/// * `s` - The view string from CLI
///
/// # Returns
/// * `Ok(View)` if the string matches a valid view
/// * `Err(CliError::InvalidView)` if the string doesn't match
pub fn parse_view_arg(s: &str) -> Result<View, CliError> {
    View::from_str(s).ok_or_else(|| CliError::InvalidView(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        match &cli.view {
            None => Ok(StartupConfig::default()),
            Some(view) => Ok(StartupConfig {
                initial_view: parse_view_arg(view)?,
            }),
        }
    }
}
