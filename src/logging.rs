//! Tracing subscriber setup
//!
//! The dashboard owns the terminal, so it logs to a file in the user cache
//! directory. One-shot subcommands log to stderr.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use directories::ProjectDirs;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Name of the log file inside the cache directory
pub const LOG_FILE_NAME: &str = "studenthub.log";

/// Where log lines are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// Errors that can occur while installing the subscriber
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to install subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Returns the platform log file path, e.g. `~/.cache/studenthub/studenthub.log`
///
/// Returns `None` if no home directory can be determined.
pub fn log_file_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "studenthub")?;
    Some(project_dirs.cache_dir().join(LOG_FILE_NAME))
}

/// Picks the file target when a path is available, stderr otherwise
pub fn dashboard_target() -> LogTarget {
    log_file_path().map(LogTarget::File).unwrap_or(LogTarget::Stderr)
}

fn open_log_file(path: &Path) -> io::Result<fs::File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber
///
/// # Arguments
/// * `level` - Maximum level to record
/// * `target` - Stderr or an append-only log file
pub fn init(level: Level, target: &LogTarget) -> Result<(), LoggingError> {
    match target {
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
