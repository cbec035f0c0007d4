//! HTTP client for the storyline API.
//!
//! Covers the two calls a recipient makes: loading a published story by
//! slug and saving the finished pass. Also provides the HTTP image loader
//! used for snapshot export.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use storyline_core::completion::CompletionSink;
use storyline_core::error::CoreError;
use storyline_core::export::{ExportError, ImageSource};
use storyline_core::story::PlayableStory;
use storyline_core::types::{Answers, Timestamp};

/// `{ "data": ... }` response envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// A previously saved pass.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicCompletion {
    pub answers: Answers,
    pub completed_at: Timestamp,
}

/// Response of `GET /api/v1/s/{slug}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicStory {
    pub story: PlayableStory,
    pub completion: Option<PublicCompletion>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Client bound to one API base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    api_url: String,
}

impl ApiClient {
    /// `api_url` is the server root, e.g. `http://localhost:3000`.
    pub fn new(client: reqwest::Client, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.api_url)
    }

    /// Load a published story and its saved completion, if any.
    pub async fn fetch_story(&self, slug: &str) -> Result<PublicStory, ApiClientError> {
        let response = self.client.get(self.url(&format!("/s/{slug}"))).send().await?;
        Self::parse_response(response).await
    }

    /// Save the answers for a story. The server keeps the latest write.
    pub async fn save_completion(
        &self,
        story_id: &str,
        answers: &Answers,
    ) -> Result<(), ApiClientError> {
        let body = serde_json::json!({ "answers": answers });
        let response = self
            .client
            .put(self.url(&format!("/stories/{story_id}/completion")))
            .json(&body)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(ApiClientError::Api {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<Envelope<T>>().await?.data)
    }
}

/// The `error` field of an API error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.to_string())
}

/// Saves completions through the API.
pub struct HttpCompletionSink {
    client: ApiClient,
}

impl HttpCompletionSink {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionSink for HttpCompletionSink {
    async fn save_completion(&self, story_id: &str, answers: &Answers) -> Result<(), CoreError> {
        self.client
            .save_completion(story_id, answers)
            .await
            .map_err(|e| match e {
                ApiClientError::Api {
                    status: 400,
                    message,
                } => CoreError::Validation(message),
                ApiClientError::Api {
                    status: 409,
                    message,
                } => CoreError::Conflict(message),
                other => CoreError::Internal(other.to_string()),
            })
    }
}

/// Fetches chapter images over HTTP.
pub struct HttpImageSource {
    client: reqwest::Client,
}

impl HttpImageSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn load(&self, url: &str) -> Result<Vec<u8>, ExportError> {
        let fail = |e: reqwest::Error| ExportError::ImageLoad {
            url: url.to_string(),
            reason: e.to_string(),
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fail)?;
        let bytes = response.bytes().await.map_err(fail)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let client = ApiClient::new(reqwest::Client::new(), "http://localhost:3000/");
        assert_eq!(client.url("/s/abc"), "http://localhost:3000/api/v1/s/abc");
    }

    #[test]
    fn error_message_prefers_error_field() {
        let body = r#"{"error":"Only published stories can be completed","code":"CONFLICT"}"#;
        assert_eq!(error_message(body), "Only published stories can be completed");
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn public_story_payload_deserializes() {
        let raw = serde_json::json!({
            "data": {
                "story": {
                    "id": "7",
                    "title": "Our Story",
                    "recipient_name": "Sam",
                    "occasion": null,
                    "final_message": { "type": "text", "content": "Always" },
                    "chapters": [{
                        "id": "11",
                        "title": null,
                        "paragraph_text": "We met.",
                        "image_url": null,
                        "image_position": "before_prompt",
                        "prompt": { "type": "none" }
                    }]
                },
                "completion": {
                    "answers": { "11": "yes" },
                    "completed_at": "2026-02-14T10:00:00Z"
                }
            }
        });
        let envelope: Envelope<PublicStory> = serde_json::from_value(raw).expect("deserialize");
        let public = envelope.data;
        assert_eq!(public.story.chapters.len(), 1);
        assert_eq!(
            public.completion.map(|c| c.answers.get("11").cloned()),
            Some(Some("yes".to_string()))
        );
    }
}
