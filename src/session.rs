//! The single live interaction owned by the coordinator.

use crate::onboarding::OnboardingStatus;
use serde::Serialize;
use std::fmt;

/// Dialogue phase.
///
/// ```text
/// Idle → SpeakingPrompt → AwaitingSpeechStart → Listening → Processing → SpeakingResult → Idle
/// Idle → Onboarding → Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    /// Speaking the one-time greeting.
    Onboarding,
    /// Speaking the "what can I do for you" prompt.
    SpeakingPrompt,
    /// Prompt finished, waiting for the recognizer start delay.
    AwaitingSpeechStart,
    Listening,
    /// Classifying and dispatching the transcript.
    Processing,
    /// Speaking the reply.
    SpeakingResult,
}

impl Phase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Onboarding => "onboarding",
            Self::SpeakingPrompt => "speaking_prompt",
            Self::AwaitingSpeechStart => "awaiting_speech_start",
            Self::Listening => "listening",
            Self::Processing => "processing",
            Self::SpeakingResult => "speaking_result",
        }
    }

    /// Whether this phase belongs to a gesture-triggered dialogue.
    #[must_use]
    pub fn in_dialogue(self) -> bool {
        !matches!(self, Self::Idle | Self::Onboarding)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session state. Only the coordinator task mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    /// Feature toggle from settings.
    pub enabled: bool,
    /// Latched by the first unlock; never cleared.
    pub unlocked: bool,
    pub phase: Phase,
    pub last_transcript: Option<String>,
    /// Torch state last reported by the host.
    pub torch_enabled: bool,
    /// Incremented for every dialogue or greeting; stale callbacks carry an
    /// older id and are dropped.
    pub generation: u64,
    #[serde(skip)]
    pub onboarding: OnboardingStatus,
}

impl Session {
    /// Whether a swipe may open a new dialogue.
    #[must_use]
    pub fn accepts_swipe(&self) -> bool {
        self.enabled && self.unlocked && self.phase == Phase::Idle
    }

    /// Start a new generation and return its id.
    pub fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}
