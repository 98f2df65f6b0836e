//! Device control surface driven by classified intents.

use crate::voice_command::{MediaOp, RingerMode};
use thiserror::Error;

/// Failure reported by an [`ActionSink`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// The package exists but has no launchable entry point.
    #[error("no launch entry for package `{0}`")]
    NoLaunchEntry(String),
    /// The device lacks the capability (e.g. no vibrator).
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("action failed: {0}")]
    Failed(String),
}

/// Host capabilities the assistant can invoke.
///
/// Calls are quick fire-and-forget requests to platform services; they must
/// not block for long.
pub trait ActionSink: Send + Sync + 'static {
    fn toggle_torch(&self) -> Result<(), ActionError>;
    fn clear_notifications(&self) -> Result<(), ActionError>;
    fn show_volume_panel(&self) -> Result<(), ActionError>;
    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), ActionError>;
    fn launch_app(&self, package_id: &str, freeform: bool) -> Result<(), ActionError>;
    fn toggle_bluetooth(&self) -> Result<(), ActionError>;
    fn media_control(&self, op: MediaOp) -> Result<(), ActionError>;
    fn launch_companion_app(&self) -> Result<(), ActionError>;
}
