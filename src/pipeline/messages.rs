//! Events delivered to the coordinator task.
//!
//! Host calls and completions of spawned work all arrive on one channel, so
//! the coordinator is the only writer of session state. Completions carry the
//! generation they were started under; anything from an older generation is
//! stale and dropped.

use crate::session::Session;
use crate::speech::{RecognitionError, SynthesisError};
use tokio::sync::oneshot;

/// Why an utterance was spoken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechPurpose {
    /// "What can I do for you?"
    Prompt,
    /// Reply to a command or apology.
    Reply,
    /// One-time onboarding greeting.
    Greeting,
}

/// Input to the coordinator loop.
#[derive(Debug)]
pub enum CoordinatorEvent {
    /// A pointer sample was classified as a two-finger swipe down.
    SwipeDown,
    /// The device was unlocked.
    Unlocked,
    /// Host-reported torch state.
    TorchState { enabled: bool },
    /// Request a copy of the session.
    Snapshot { reply: oneshot::Sender<Session> },
    Shutdown,
    /// Synthesizer finished (or failed) an utterance.
    SpeechFinished {
        generation: u64,
        purpose: SpeechPurpose,
        result: Result<(), SynthesisError>,
    },
    /// The pause between prompt and recognizer start is over.
    ListenDelayElapsed { generation: u64 },
    /// Recognizer produced its one result for this dialogue.
    Recognized {
        generation: u64,
        result: Result<String, RecognitionError>,
    },
    /// Intent dispatch completed; `reply` is what to say, if anything.
    Dispatched {
        generation: u64,
        reply: Option<String>,
    },
    /// Upper bound on the onboarding broadcast was reached.
    GreetingTimeout { generation: u64 },
}
