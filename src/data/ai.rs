//! Generative language API client
//!
//! Sends single-turn prompts to the `generateContent` endpoint and returns
//! the first candidate's text. Prompt builders for summaries and homework
//! help live here too.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::client_or_default;

/// Base URL for the generative language API
const GENERATIVE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used for every request
const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Model calls can be slow; allow longer than the LMS timeout
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Errors that can occur when calling the model
#[derive(Debug, Error)]
pub enum AiError {
    /// Prompt or input text was blank
    #[error("Empty text provided")]
    EmptyInput,

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Model API returned status {0}")]
    Status(u16),

    /// The response carried no text
    #[error("Empty response received from model API")]
    EmptyResponse,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// Response from `generateContent`
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Joins the text parts of the first candidate, trimmed
fn extract_text(response: GenerateResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Prompt asking for a concise summary of `text`
pub fn summary_prompt(text: &str) -> String {
    format!(
        "Please provide a concise summary of the following text, \
         highlighting the key points and main ideas:\n\n{}",
        text
    )
}

/// Prompt asking for help with an assignment
pub fn homework_prompt(assignment_name: &str, course_name: &str, description: &str) -> String {
    format!(
        "Help me with this assignment for my {course} class: {assignment}\n\
         Assignment Description: {description}\n\n\
         Please answer like a college student, following these rules:\n\
         - Use complete sentences and clear language\n\
         - Write in paragraph form\n\
         - Include only the assignment content\n\
         - No headers, footers, or special formatting\n\n\
         Format the response as plain text without any Markdown or special characters.",
        course = course_name,
        assignment = assignment_name,
        description = description,
    )
}

/// Client for the generative language API
#[derive(Debug, Clone)]
pub struct AiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AiClient {
    /// Creates a client using `api_key`
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = client_or_default(
            Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build(),
        );
        Self::with_client(client, api_key)
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: GENERATIVE_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Points the client at another host
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sends `prompt` and returns the model's text
    ///
    /// # Arguments
    /// * `prompt` - Non-blank prompt text
    ///
    /// # Returns
    /// * `Ok(String)` - Trimmed response text
    /// * `Err(AiError)` - If the prompt is blank, the call fails or no text comes back
    pub async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        if prompt.trim().is_empty() {
            return Err(AiError::EmptyInput);
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AiError::Status(response.status().as_u16()));
        }

        let parsed: GenerateResponse = response.json().await?;
        extract_text(parsed).ok_or(AiError::EmptyResponse)
    }

    /// Summarizes `text`
    pub async fn summarize_text(&self, text: &str) -> Result<String, AiError> {
        if text.trim().is_empty() {
            return Err(AiError::EmptyInput);
        }
        info!(chars = text.len(), "Generating summary");
        self.generate(&summary_prompt(text)).await
    }

    /// Asks for help with an assignment
    pub async fn homework_help(
        &self,
        assignment_name: &str,
        course_name: &str,
        description: &str,
    ) -> Result<String, AiError> {
        self.generate(&homework_prompt(assignment_name, course_name, description))
            .await
    }

    /// Free-form prompt; failures are logged and yield `None`
    pub async fn ai_response(&self, prompt: &str) -> Option<String> {
        match self.generate(prompt).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(error = %e, "Error getting AI response");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> GenerateResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_text_joins_parts_and_trims() {
        let response = parse(
            r#"{"candidates": [
                {"content": {"parts": [{"text": "  Photosynthesis "}, {"text": "makes sugar.\n"}], "role": "model"}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]}"#,
        );

        assert_eq!(
            extract_text(response).as_deref(),
            Some("Photosynthesis makes sugar.")
        );
    }

    #[test]
    fn test_extract_text_without_candidates() {
        assert_eq!(extract_text(parse(r#"{}"#)), None);
        assert_eq!(extract_text(parse(r#"{"candidates": [{}]}"#)), None);
        assert_eq!(
            extract_text(parse(r#"{"candidates": [{"content": {"parts": [{"text": "  "}]}}]}"#)),
            None
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: "hi" }],
            }],
        };

        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json, serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]}));
    }

    #[test]
    fn test_prompts_embed_inputs() {
        assert!(summary_prompt("cells divide").ends_with("cells divide"));

        let prompt = homework_prompt("Lab 3", "Biology", "Describe mitosis");
        assert!(prompt.contains("Biology class: Lab 3"));
        assert!(prompt.contains("Assignment Description: Describe mitosis"));
    }

    #[tokio::test]
    async fn test_blank_input_rejected_before_request() {
        let client = AiClient::new("key").with_base_url("http://127.0.0.1:9");

        assert!(matches!(client.summarize_text("   ").await, Err(AiError::EmptyInput)));
        assert!(matches!(client.generate("").await, Err(AiError::EmptyInput)));
    }

    #[tokio::test]
    async fn test_ai_response_degrades_to_none() {
        let client = AiClient::new("key").with_base_url("http://127.0.0.1:9");
        assert_eq!(client.ai_response("What is osmosis?").await, None);
    }
}
