//! Remote question answering.
//!
//! [`RemoteQueryAdapter`] turns a question into one request against a
//! [`LanguageBackend`] and always hands back speakable prose: either the
//! sanitized answer or a fixed apology. Callers never see an error.

pub mod gemini;

pub use gemini::{GeminiBackend, GeminiConfig};

use crate::config::RemoteConfig;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Failure talking to the language backend.
///
/// Each variant has a stable code available through [`RemoteError::code`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// No API key is configured.
    #[error("[MISSING_CREDENTIAL] no API key configured")]
    MissingCredential,
    /// Transport failure (connect, timeout, body read).
    #[error("[REQUEST_FAILED] {0}")]
    Request(String),
    /// Non-success HTTP status.
    #[error("[HTTP_{status}] {message}")]
    Http { status: u16, message: String },
    /// Response body was not the expected JSON shape.
    #[error("[PARSE_FAILED] {0}")]
    Parse(String),
    /// The backend answered without any text.
    #[error("[EMPTY_ANSWER] backend returned no text")]
    EmptyAnswer,
}

impl RemoteError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MISSING_CREDENTIAL",
            Self::Request(_) => "REQUEST_FAILED",
            Self::Http { .. } => "HTTP_ERROR",
            Self::Parse(_) => "PARSE_FAILED",
            Self::EmptyAnswer => "EMPTY_ANSWER",
        }
    }
}

/// A generative language service answering one prompt at a time.
#[async_trait]
pub trait LanguageBackend: Send + Sync + 'static {
    /// Send `prompt` and return the raw answer text.
    async fn generate(&self, api_key: &str, prompt: &str) -> Result<String, RemoteError>;
}

/// Builds prompts, calls the backend and sanitizes the answer.
#[derive(Clone)]
pub struct RemoteQueryAdapter {
    backend: Arc<dyn LanguageBackend>,
    brief_prefix: String,
    fallback_answer: String,
}

impl std::fmt::Debug for RemoteQueryAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteQueryAdapter")
            .field("brief_prefix", &self.brief_prefix)
            .finish_non_exhaustive()
    }
}

impl RemoteQueryAdapter {
    pub fn new(backend: Arc<dyn LanguageBackend>, config: &RemoteConfig) -> Self {
        Self {
            backend,
            brief_prefix: config.brief_prefix.clone(),
            fallback_answer: config.fallback_answer.clone(),
        }
    }

    /// The apology returned whenever the backend fails.
    pub fn fallback_answer(&self) -> &str {
        &self.fallback_answer
    }

    /// Prompt actually sent for `text`.
    pub fn build_prompt(&self, text: &str, brief: bool) -> String {
        if brief {
            format!("{}{text}", self.brief_prefix)
        } else {
            text.to_owned()
        }
    }

    /// Ask the backend and return speakable text.
    ///
    /// Any failure, including a missing key or an answer that sanitizes to
    /// nothing, yields [`fallback_answer`](Self::fallback_answer).
    pub async fn query(&self, text: &str, brief: bool, api_key: &str) -> String {
        match self.try_query(text, brief, api_key).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(code = e.code(), "remote query failed: {e}");
                self.fallback_answer.clone()
            }
        }
    }

    async fn try_query(&self, text: &str, brief: bool, api_key: &str) -> Result<String, RemoteError> {
        if api_key.trim().is_empty() {
            return Err(RemoteError::MissingCredential);
        }
        let prompt = self.build_prompt(text, brief);
        debug!(brief, chars = prompt.len(), "sending remote query");
        let raw = self.backend.generate(api_key, &prompt).await?;
        let answer = sanitize_answer(&raw);
        if answer.is_empty() {
            return Err(RemoteError::EmptyAnswer);
        }
        Ok(answer)
    }
}

/// Strip markdown emphasis, fold newlines and whitespace runs into single
/// spaces, and trim.
///
/// # Examples
///
/// ```
/// use risa::remote::sanitize_answer;
///
/// assert_eq!(sanitize_answer("**Paris** is\n\nthe  capital."), "Paris is the capital.");
/// ```
#[must_use]
pub fn sanitize_answer(raw: &str) -> String {
    raw.replace('*', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
