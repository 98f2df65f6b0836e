//! First-run onboarding for the assistant.
//!
//! The first time the assistant is observed enabled, it speaks a fixed
//! greeting explaining how to summon it. The greeting is bracketed by an
//! "assistant active" broadcast pair and the completion flag is persisted so
//! it never repeats.

/// Introduction spoken the first time the assistant is enabled.
pub const DEFAULT_GREETING: &str = "Hello, I am Risa, your daily assistant. To ask for my help, \
     please perform a two-finger swipe down gesture. Have a great day.";

/// Where the one-time greeting stands within this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnboardingStatus {
    /// Not yet triggered.
    #[default]
    NotStarted,
    /// Triggered while a session was active; runs once the session drains.
    Deferred,
    /// Greeting is playing.
    Playing,
    /// Played, or the persisted flag was already set. The stored flag stays
    /// authoritative: if a host clears it, the greeting becomes due again.
    Finished,
}

impl OnboardingStatus {
    /// Decide what to do after the settings were re-read.
    ///
    /// `enabled` is the feature toggle, `persisted` the stored completion flag
    /// and `idle` whether no session is active.
    ///
    /// # Examples
    ///
    /// ```
    /// use risa::onboarding::{OnboardingStatus, OnboardingStep};
    ///
    /// let status = OnboardingStatus::NotStarted;
    /// assert_eq!(status.next_step(true, false, true), OnboardingStep::Start);
    /// assert_eq!(status.next_step(true, false, false), OnboardingStep::Defer);
    /// assert_eq!(status.next_step(true, true, true), OnboardingStep::AlreadyDone);
    /// ```
    #[must_use]
    pub fn next_step(self, enabled: bool, persisted: bool, idle: bool) -> OnboardingStep {
        match self {
            Self::Playing => OnboardingStep::Nothing,
            _ if persisted => OnboardingStep::AlreadyDone,
            _ if !enabled => OnboardingStep::Nothing,
            _ if idle => OnboardingStep::Start,
            Self::Deferred => OnboardingStep::Nothing,
            Self::NotStarted | Self::Finished => OnboardingStep::Defer,
        }
    }
}

/// Outcome of [`OnboardingStatus::next_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStep {
    /// Play the greeting now.
    Start,
    /// Remember the trigger and play once the session ends.
    Defer,
    /// The stored flag says the greeting already played.
    AlreadyDone,
    Nothing,
}
