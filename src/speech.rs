//! Speech collaborator traits.
//!
//! The recognizer and synthesizer are host engines. Each call is one
//! request whose future resolving is the completion signal, so the
//! coordinator never installs or swaps callback objects.

use async_trait::async_trait;
use thiserror::Error;

/// Terminal recognition failure for one listening request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    /// Speech was heard but matched nothing (also used for empty results).
    #[error("no recognition match")]
    NoMatch,
    /// The recognizer could not reach its service.
    #[error("recognizer network failure")]
    Network,
    #[error("recognizer failed: {0}")]
    Other(String),
}

impl RecognitionError {
    /// Apology spoken for this class of failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use risa::speech::RecognitionError;
    ///
    /// assert_eq!(
    ///     RecognitionError::Network.fallback_reply(),
    ///     "Network error. Please check your connection."
    /// );
    /// ```
    #[must_use]
    pub fn fallback_reply(&self) -> &'static str {
        match self {
            Self::NoMatch => "I didn't catch that. Please try again.",
            Self::Network => "Network error. Please check your connection.",
            Self::Other(_) => "Sorry, something went wrong. Please try again.",
        }
    }
}

/// Synthesis failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    /// A newer utterance flushed this one before it finished.
    #[error("utterance interrupted")]
    Interrupted,
    #[error("synthesizer failed: {0}")]
    Engine(String),
}

/// Speech-to-text engine.
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Listen for one utterance and return its final transcript.
    ///
    /// Resolves exactly once per call, with either the transcript or the
    /// failure class.
    async fn listen(&self) -> Result<String, RecognitionError>;
}

/// Text-to-speech engine.
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Speak `text`, resolving after playback has finished.
    ///
    /// A later call flushes an utterance still playing; the flushed call
    /// resolves with [`SynthesisError::Interrupted`].
    async fn speak(&self, text: &str) -> Result<(), SynthesisError>;
}
