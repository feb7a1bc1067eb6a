//! Mailbox API client
//!
//! Lists mail from an allow-list of senders using an already-issued bearer
//! token. Message bodies are the decoded `text/plain` parts of the MIME tree.

use base64::prelude::*;
use chrono::{DateTime, TimeZone, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Base URL for the mailbox API, scoped to the authenticated user
const MAILBOX_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Sender value that selects every allowed sender
pub const ALL_SENDERS: &str = "all";

/// Default page size for listings
pub const DEFAULT_PER_PAGE: usize = 20;

pub const NO_SUBJECT: &str = "No Subject";
pub const NO_CONTENT: &str = "No content available";

/// Errors that can occur when reading mail
#[derive(Debug, Error)]
pub enum InboxError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Mailbox API returned status {0}")]
    Status(u16),

    /// The requested sender is not on the allow-list
    #[error("Invalid or unauthorized sender: {0}")]
    UnauthorizedSender(String),
}

/// A message id from a listing
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

/// A full message
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    /// Milliseconds since the epoch, as a decimal string
    #[serde(default)]
    pub internal_date: String,
    pub payload: MessagePart,
}

/// A node of the MIME tree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: Option<PartBody>,
    #[serde(default)]
    pub parts: Option<Vec<MessagePart>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    /// base64url-encoded content
    #[serde(default)]
    pub data: Option<String>,
}

/// A message reduced to what the inbox view shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Email {
    pub id: String,
    pub subject: String,
    pub body: String,
    /// Milliseconds since the epoch
    pub timestamp: i64,
    pub sender: String,
}

impl Email {
    /// Builds an email from a full message, filling placeholders
    pub fn from_message(message: &Message, sender: &str) -> Self {
        let subject = message
            .payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case("subject"))
            .map(|h| h.value.clone())
            .unwrap_or_else(|| NO_SUBJECT.to_string());
        let body = extract_body(&message.payload)
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| NO_CONTENT.to_string());

        Self {
            id: message.id.clone(),
            subject,
            body,
            timestamp: message.internal_date.parse().unwrap_or(0),
            sender: sender.to_string(),
        }
    }

    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// One page of emails, newest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailPage {
    pub emails: Vec<Email>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

/// Decodes a base64url body, tolerating missing padding
fn decode_part(part: &MessagePart) -> Option<String> {
    let data = part.body.as_ref()?.data.as_deref()?;
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(data.trim_end_matches('='))
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Concatenates the `text/plain` parts of a message, depth first
pub fn extract_body(payload: &MessagePart) -> Option<String> {
    let Some(parts) = &payload.parts else {
        return decode_part(payload);
    };

    let texts: Vec<String> = parts
        .iter()
        .filter_map(|part| {
            if part.mime_type == "text/plain" {
                decode_part(part)
            } else if part.parts.is_some() {
                extract_body(part)
            } else {
                None
            }
        })
        .filter(|text| !text.is_empty())
        .collect();
    Some(texts.join("\n"))
}

/// Sorts newest first and cuts out one 1-based page
pub fn paginate(mut emails: Vec<Email>, page: usize, per_page: usize) -> EmailPage {
    let page = page.max(1);
    let per_page = per_page.max(1);
    emails.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let total = emails.len();
    let start = (page - 1).saturating_mul(per_page);
    let page_emails = emails.into_iter().skip(start).take(per_page).collect();

    EmailPage {
        emails: page_emails,
        total,
        page,
        per_page,
        total_pages: total.div_ceil(per_page),
    }
}

/// Client for the mailbox API
#[derive(Debug, Clone)]
pub struct InboxClient {
    client: Client,
    token: String,
    allowed_senders: Vec<String>,
    base_url: String,
}

impl InboxClient {
    /// Creates a client with a bearer token and sender allow-list
    pub fn new(token: impl Into<String>, allowed_senders: Vec<String>) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            allowed_senders,
            base_url: MAILBOX_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn allowed_senders(&self) -> &[String] {
        &self.allowed_senders
    }

    /// Lists message ids matching a search query
    pub async fn list_messages(&self, query: &str, max_results: usize) -> Result<Vec<MessageRef>, InboxError> {
        let url = format!("{}/messages", self.base_url);
        let max_results = max_results.to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("q", query), ("maxResults", max_results.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InboxError::Status(response.status().as_u16()));
        }

        let parsed: ListResponse = response.json().await?;
        Ok(parsed.messages)
    }

    /// Fetches one full message
    pub async fn get_message(&self, id: &str) -> Result<Message, InboxError> {
        let url = format!("{}/messages/{}", self.base_url, id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("format", "full")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InboxError::Status(response.status().as_u16()));
        }

        Ok(response.json().await?)
    }

    /// Recent mail from one sender; failures are logged and yield nothing
    async fn emails_for(&self, sender: &str, max_results: usize) -> Vec<Email> {
        let refs = match self.list_messages(&format!("from:{}", sender), max_results).await {
            Ok(refs) => refs,
            Err(e) => {
                warn!(sender, error = %e, "Error listing messages");
                return Vec::new();
            }
        };

        join_all(refs.iter().map(|r| self.get_message(&r.id)))
            .await
            .into_iter()
            .filter_map(|result| match result {
                Ok(message) => Some(Email::from_message(&message, sender)),
                Err(e) => {
                    warn!(sender, error = %e, "Skipping message");
                    None
                }
            })
            .collect()
    }

    /// Paginated mail from an allowed sender, or from all of them
    ///
    /// # Arguments
    /// * `sender` - An allowed address, or `"all"`
    /// * `page` - 1-based page number
    /// * `per_page` - Page size, also the per-sender fetch limit
    ///
    /// # Returns
    /// * `Ok(EmailPage)` - Newest first
    /// * `Err(InboxError::UnauthorizedSender)` - If `sender` is not allowed
    pub async fn emails_from_sender(
        &self,
        sender: &str,
        page: usize,
        per_page: usize,
    ) -> Result<EmailPage, InboxError> {
        let senders: Vec<&str> = if sender == ALL_SENDERS {
            self.allowed_senders.iter().map(String::as_str).collect()
        } else if self.allowed_senders.iter().any(|s| s == sender) {
            vec![sender]
        } else {
            return Err(InboxError::UnauthorizedSender(sender.to_string()));
        };

        let mut emails = Vec::new();
        for sender in senders {
            emails.extend(self.emails_for(sender, per_page).await);
        }
        info!(count = emails.len(), "Fetched emails");

        Ok(paginate(emails, page, per_page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str) -> String {
        BASE64_URL_SAFE.encode(text)
    }

    fn email(id: &str, timestamp: i64) -> Email {
        Email {
            id: id.to_string(),
            subject: NO_SUBJECT.to_string(),
            body: NO_CONTENT.to_string(),
            timestamp,
            sender: "prof@school.edu".to_string(),
        }
    }

    #[test]
    fn test_message_with_nested_parts() {
        let json = serde_json::json!({
            "id": "m1",
            "internalDate": "1760000000000",
            "payload": {
                "mimeType": "multipart/mixed",
                "headers": [{"name": "Subject", "value": "Midterm moved"}],
                "parts": [
                    {"mimeType": "multipart/alternative", "parts": [
                        {"mimeType": "text/plain", "body": {"data": encode("Room 204.")}},
                        {"mimeType": "text/html", "body": {"data": encode("<p>Room 204.</p>")}}
                    ]},
                    {"mimeType": "text/plain", "body": {"data": encode("Bring a calculator ~?")}}
                ]
            }
        });
        let message: Message = serde_json::from_value(json).unwrap();

        let email = Email::from_message(&message, "prof@school.edu");

        assert_eq!(email.subject, "Midterm moved");
        assert_eq!(email.body, "Room 204.\nBring a calculator ~?");
        assert_eq!(email.timestamp, 1_760_000_000_000);
        assert!(email.received_at().is_some());
    }

    #[test]
    fn test_single_part_unpadded_body() {
        let json = serde_json::json!({
            "id": "m2",
            "internalDate": "5",
            "payload": {
                "mimeType": "text/plain",
                "headers": [],
                "body": {"data": BASE64_URL_SAFE_NO_PAD.encode("ok")}
            }
        });
        let message: Message = serde_json::from_value(json).unwrap();

        let email = Email::from_message(&message, "ta@school.edu");

        assert_eq!(email.subject, NO_SUBJECT);
        assert_eq!(email.body, "ok");
    }

    #[test]
    fn test_missing_body_uses_placeholder() {
        let json = serde_json::json!({
            "id": "m3",
            "payload": {"mimeType": "multipart/mixed", "parts": [
                {"mimeType": "text/html", "body": {"data": encode("<b>hi</b>")}}
            ]}
        });
        let message: Message = serde_json::from_value(json).unwrap();

        let email = Email::from_message(&message, "ta@school.edu");

        assert_eq!(email.body, NO_CONTENT);
        assert_eq!(email.timestamp, 0);
    }

    #[test]
    fn test_paginate_sorts_newest_first() {
        let emails = vec![email("a", 1), email("b", 3), email("c", 2)];

        let page = paginate(emails, 1, 2);

        let ids: Vec<&str> = page.emails.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let page = paginate(vec![email("a", 1)], 3, 20);

        assert!(page.emails.is_empty());
        assert_eq!(page.total, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 3);
    }

    #[test]
    fn test_paginate_no_emails() {
        let page = paginate(Vec::new(), 1, 20);
        assert_eq!(page.total_pages, 0);
    }

    #[tokio::test]
    async fn test_unknown_sender_is_rejected() {
        let client = InboxClient::new("token", vec!["prof@school.edu".to_string()])
            .with_base_url("http://127.0.0.1:9");

        let result = client.emails_from_sender("spam@example.com", 1, 20).await;

        assert!(matches!(result, Err(InboxError::UnauthorizedSender(s)) if s == "spam@example.com"));
    }

    #[tokio::test]
    async fn test_unreachable_mailbox_yields_empty_page() {
        let client = InboxClient::new("token", vec!["prof@school.edu".to_string()])
            .with_base_url("http://127.0.0.1:9");

        let page = client.emails_from_sender(ALL_SENDERS, 1, 20).await.unwrap();

        assert!(page.emails.is_empty());
        assert_eq!(page.total, 0);
    }
}
