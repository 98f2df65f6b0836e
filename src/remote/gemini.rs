//! Gemini `generateContent` backend.
//!
//! One non-streaming request per query:
//!
//! ```text
//! POST {base_url}/v1beta/models/{model}:generateContent?key={api_key}
//! {"contents":[{"parts":[{"text":"..."}]}]}
//! ```
//!
//! The answer is read from `candidates[0].content.parts[0].text`.

use super::{LanguageBackend, RemoteError};
use crate::config::RemoteConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Connection settings for [`GeminiBackend`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL (defaults to `https://generativelanguage.googleapis.com`).
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_owned(),
            model: model.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Override the base URL (e.g. for a proxy or a test server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Endpoint for the configured model, without the key.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl From<&RemoteConfig> for GeminiConfig {
    fn from(config: &RemoteConfig) -> Self {
        Self::new(config.model.clone())
            .with_base_url(config.base_url.clone())
            .with_timeout(config.timeout())
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Build the `generateContent` request body.
pub fn build_request(prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "contents": [{ "parts": [{ "text": prompt }] }]
    })
}

/// Extract the first candidate's first text part.
///
/// # Errors
///
/// Returns [`RemoteError::Parse`] for malformed JSON and
/// [`RemoteError::EmptyAnswer`] when the path holds no text.
pub fn parse_response(body: &str) -> Result<String, RemoteError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|e| RemoteError::Parse(e.to_string()))?;
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or(RemoteError::EmptyAnswer)
}

/// Gemini backend over HTTPS.
pub struct GeminiBackend {
    config: GeminiConfig,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Self {
        let client = reqwest::Client::new();
        Self { config, client }
    }

    fn map_http_error(status: reqwest::StatusCode, body: &str) -> RemoteError {
        RemoteError::Http {
            status: status.as_u16(),
            message: extract_error_message(body),
        }
    }
}

/// Pull `error.message` out of an error body, falling back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl LanguageBackend for GeminiBackend {
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, RemoteError> {
        let url = self.config.endpoint();
        debug!(model = %self.config.model, "gemini generateContent");

        // The key travels in the query string, so strip URLs from transport
        // errors before they reach the logs.
        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .timeout(self.config.timeout)
            .json(&build_request(prompt))
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Request(e.without_url().to_string()))?;
        if !status.is_success() {
            return Err(Self::map_http_error(status, &body));
        }
        parse_response(&body)
    }
}
