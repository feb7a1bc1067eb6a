//! Environment configuration
//!
//! Settings come from the process environment, optionally seeded from a
//! `.env` file in the working directory. Only the LMS token and URL are
//! required up front; the other service keys are checked by the command
//! that needs them.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::Level;

use crate::cache::DEFAULT_TTL_SECS;

/// Errors raised while reading configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank
    #[error("{0} not found in environment variables")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// LMS access token
    pub canvas_token: String,
    /// Normalized LMS base URL, e.g. `https://school.instructure.com`
    pub canvas_url: String,
    /// Lifetime of cached LMS responses
    pub cache_ttl: Duration,
    pub gemini_api_key: Option<String>,
    pub youtube_api_key: Option<String>,
    /// Pre-issued mailbox access token
    pub gmail_access_token: Option<String>,
    /// Senders whose mail may be listed
    pub allowed_senders: Vec<String>,
    /// Pre-issued documents/drive access token
    pub google_access_token: Option<String>,
    /// CSV mapping class names to folder ids
    pub folder_ids_path: PathBuf,
    /// Maximum log level
    pub log_level: Level,
}

impl Config {
    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup
    ///
    /// # Arguments
    /// * `lookup` - Returns the value for a variable name, if set
    ///
    /// # Returns
    /// * `Ok(Config)` - When the required variables are present and valid
    /// * `Err(ConfigError)` - Naming the first missing or invalid variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let canvas_token = get("CANVAS_API_TOKEN").ok_or(ConfigError::Missing("CANVAS_API_TOKEN"))?;
        let canvas_url = get("CANVAS_URL")
            .map(|url| format_canvas_url(&url))
            .ok_or(ConfigError::Missing("CANVAS_URL"))?;

        let cache_ttl = match get("CACHE_TTL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    key: "CACHE_TTL_SECS",
                    value: raw,
                })?,
            None => Duration::from_secs(DEFAULT_TTL_SECS),
        };

        let log_level = match get("STUDENTHUB_LOG") {
            Some(raw) => parse_log_level(&raw).ok_or(ConfigError::Invalid {
                key: "STUDENTHUB_LOG",
                value: raw,
            })?,
            None => Level::INFO,
        };

        Ok(Self {
            canvas_token,
            canvas_url,
            cache_ttl,
            gemini_api_key: get("GEMINI_API_KEY"),
            youtube_api_key: get("YOUTUBE_API_KEY"),
            gmail_access_token: get("GMAIL_ACCESS_TOKEN"),
            allowed_senders: parse_allowed_senders(&get("ALLOWED_SENDERS").unwrap_or_default()),
            google_access_token: get("GOOGLE_ACCESS_TOKEN"),
            folder_ids_path: get("FOLDER_IDS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("Folder_Ids.csv")),
            log_level,
        })
    }

    /// Returns an optional key or a `Missing` error naming it
    pub fn require<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, ConfigError> {
        value.as_deref().ok_or(ConfigError::Missing(key))
    }
}

/// Prefixes `https://` when no scheme is given and strips trailing slashes
pub fn format_canvas_url(url: &str) -> String {
    let url = url.trim();
    let url = if url.starts_with("http") {
        url.to_string()
    } else {
        format!("https://{}", url)
    };
    url.trim_end_matches('/').to_string()
}

/// Splits a comma separated sender list, dropping blanks
pub fn parse_allowed_senders(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_log_level(raw: &str) -> Option<Level> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("CANVAS_API_TOKEN", "token-123"),
            ("CANVAS_URL", "school.instructure.com/"),
        ]
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_lookup(lookup_from(&required())).unwrap();

        assert_eq!(config.canvas_token, "token-123");
        assert_eq!(config.canvas_url, "https://school.instructure.com");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.allowed_senders.is_empty());
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn test_missing_token_is_error() {
        let result = Config::from_lookup(lookup_from(&[("CANVAS_URL", "x.edu")]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("CANVAS_API_TOKEN"));
    }

    #[test]
    fn test_blank_url_is_missing() {
        let result = Config::from_lookup(lookup_from(&[
            ("CANVAS_API_TOKEN", "t"),
            ("CANVAS_URL", "   "),
        ]));
        assert_eq!(result.unwrap_err(), ConfigError::Missing("CANVAS_URL"));
    }

    #[test]
    fn test_invalid_ttl_is_error() {
        let mut pairs = required();
        pairs.push(("CACHE_TTL_SECS", "five"));

        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { key: "CACHE_TTL_SECS", .. }));
    }

    #[test]
    fn test_optional_values_are_read() {
        let mut pairs = required();
        pairs.extend([
            ("CACHE_TTL_SECS", "60"),
            ("STUDENTHUB_LOG", "DEBUG"),
            ("ALLOWED_SENDERS", "prof@school.edu, ,ta@school.edu,"),
            ("GEMINI_API_KEY", "g-key"),
            ("FOLDER_IDS_PATH", "/tmp/folders.csv"),
        ]);

        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();

        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.allowed_senders, vec!["prof@school.edu", "ta@school.edu"]);
        assert_eq!(Config::require(&config.gemini_api_key, "GEMINI_API_KEY"), Ok("g-key"));
        assert_eq!(config.folder_ids_path, PathBuf::from("/tmp/folders.csv"));
    }

    #[test]
    fn test_require_reports_missing_key() {
        let config = Config::from_lookup(lookup_from(&required())).unwrap();
        assert_eq!(
            Config::require(&config.youtube_api_key, "YOUTUBE_API_KEY"),
            Err(ConfigError::Missing("YOUTUBE_API_KEY"))
        );
    }

    #[test]
    fn test_format_canvas_url() {
        assert_eq!(format_canvas_url("http://local:3000/"), "http://local:3000");
        assert_eq!(format_canvas_url("https://a.edu"), "https://a.edu");
        assert_eq!(format_canvas_url("a.edu//"), "https://a.edu");
    }
}
