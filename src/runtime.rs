//! Runtime events emitted by the coordinator for status indicators and
//! observability.
//!
//! Events are small and cloneable so the coordinator never blocks on a slow
//! observer; lagging subscribers simply miss events.

use crate::session::Phase;
use crate::voice_command::Intent;

/// What the assistant is doing "right now".
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// A dialogue opened (`true`) or drained back to idle (`false`).
    ///
    /// Always paired: exactly one `false` follows every `true`.
    ListeningChanged { active: bool },
    /// Bracket around the onboarding greeting, always start then stop.
    AssistantActive { active: bool },
    /// Phase transition.
    PhaseChanged { from: Phase, to: Phase },
    /// Final transcript delivered by the recognizer.
    Transcription { text: String },
    /// Intent picked for the latest transcript.
    IntentClassified { intent: Intent },
    /// Text handed to the synthesizer.
    Spoken { text: String },
}
