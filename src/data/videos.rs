//! Video search API client
//!
//! Looks up embeddable English videos for a study topic.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Base URL for the video search API
const SEARCH_BASE_URL: &str = "https://www.googleapis.com/youtube/v3/search";

/// Number of videos returned when the caller does not ask for more
pub const DEFAULT_MAX_RESULTS: u32 = 3;

/// Errors that can occur when searching videos
#[derive(Debug, Error)]
pub enum VideoError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("Video search returned status {0}")]
    Status(u16),
}

/// A recommended video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub title: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// Watch page for a video id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Maps search results to videos, skipping items without a video id
fn parse_items(response: SearchResponse) -> Vec<Video> {
    response
        .items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.id.video_id?;
            Some(Video {
                title: item.snippet.title,
                url: watch_url(&video_id),
                description: item.snippet.description,
            })
        })
        .collect()
}

/// Client for the video search API
#[derive(Debug, Clone)]
pub struct VideoClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl VideoClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_key)
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: SEARCH_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Searches for videos about `query`
    ///
    /// # Arguments
    /// * `query` - Topic to search for
    /// * `max_results` - Upper bound on returned videos
    ///
    /// # Returns
    /// * `Ok(Vec<Video>)` - Matching videos in relevance order
    /// * `Err(VideoError)` - If the request fails
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<Video>, VideoError> {
        info!(query, max_results, "Searching videos");
        let max_results = max_results.to_string();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("part", "snippet"),
                ("maxResults", max_results.as_str()),
                ("q", query),
                ("type", "video"),
                ("relevanceLanguage", "en"),
                ("videoEmbeddable", "true"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VideoError::Status(response.status().as_u16()));
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(parse_items(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_items_builds_watch_urls() {
        let response: SearchResponse = serde_json::from_str(
            r#"{
                "kind": "youtube#searchListResponse",
                "items": [
                    {"id": {"kind": "youtube#video", "videoId": "abc123"},
                     "snippet": {"title": "Cell Division", "description": "Mitosis explained"}},
                    {"id": {"kind": "youtube#channel", "channelId": "xyz"},
                     "snippet": {"title": "A channel", "description": ""}}
                ]
            }"#,
        )
        .unwrap();

        let videos = parse_items(response);

        assert_eq!(
            videos,
            vec![Video {
                title: "Cell Division".to_string(),
                url: "https://www.youtube.com/watch?v=abc123".to_string(),
                description: "Mitosis explained".to_string(),
            }]
        );
    }

    #[test]
    fn test_parse_items_empty_response() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parse_items(response).is_empty());
    }

    #[tokio::test]
    async fn test_search_unreachable_host_is_error() {
        let client = VideoClient::new("key").with_base_url("http://127.0.0.1:9/search");

        let result = client.search("photosynthesis", DEFAULT_MAX_RESULTS).await;

        assert!(matches!(result, Err(VideoError::RequestFailed(_))));
    }
}
