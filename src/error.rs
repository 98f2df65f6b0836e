//! Error types for the risa assistant.

/// Top-level error type for the assistant runtime.
///
/// Collaborator failures that the dialogue recovers from (recognition,
/// synthesis, action and remote errors) have their own narrower types in
/// [`crate::speech`], [`crate::actions`] and [`crate::remote`]; this enum
/// covers the plumbing around them.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Settings store read/write error.
    #[error("settings error: {0}")]
    Settings(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, AssistantError>;
