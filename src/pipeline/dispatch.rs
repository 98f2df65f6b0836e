//! Executes a classified intent and chooses the spoken reply.
//!
//! | Intent | Success reply |
//! |---|---|
//! | `ToggleTorch` | "Torch successfully turned on" / "Torch has been disabled" |
//! | `ClearNotifications` | "All notifications cleared" |
//! | `ShowVolumePanel` | "Showing the volume panel." |
//! | `SetRingerMode` | "Ringer mode successfully set to {mode} mode" |
//! | `LaunchApp` | "Sure thing! Launching {label}" [" in freeform mode"] |
//! | `ToggleBluetooth` | "Toggling Bluetooth." |
//! | `BriefQuery` / `GeneralQuery` | remote answer or apology |
//! | `OpenCompanionAssistant` | "Sure thing! Trying to establish connection with chat gpt" |
//! | `MediaControl` | silent |
//!
//! Action failures other than a missing launch entry or an unsupported
//! ringer mode are logged and produce no reply.

use crate::actions::{ActionError, ActionSink};
use crate::catalog::AppCatalog;
use crate::remote::RemoteQueryAdapter;
use crate::voice_command::Intent;
use std::sync::Arc;
use tracing::{info, warn};

const UNRESOLVED_APP_REPLY: &str = "Sorry, I couldn't identify the application.";
const COMPANION_REPLY: &str = "Sure thing! Trying to establish connection with chat gpt";

/// Session values a dispatch needs, copied out when processing starts.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DispatchContext {
    /// Torch state as last reported by the host.
    pub torch_enabled: bool,
    /// Credential for remote queries (may be empty).
    pub api_key: String,
}

impl std::fmt::Debug for DispatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchContext")
            .field("torch_enabled", &self.torch_enabled)
            .finish_non_exhaustive()
    }
}

/// Maps intents onto the action sink, app catalog and remote adapter.
pub struct CommandDispatcher {
    actions: Arc<dyn ActionSink>,
    catalog: AppCatalog,
    remote: RemoteQueryAdapter,
}

impl CommandDispatcher {
    pub fn new(actions: Arc<dyn ActionSink>, catalog: AppCatalog, remote: RemoteQueryAdapter) -> Self {
        Self {
            actions,
            catalog,
            remote,
        }
    }

    pub fn catalog(&self) -> &AppCatalog {
        &self.catalog
    }

    /// Run `intent` and return what should be spoken, if anything.
    pub async fn execute(&self, intent: &Intent, ctx: &DispatchContext) -> Option<String> {
        match intent {
            Intent::ToggleTorch => self.act("toggle_torch", self.actions.toggle_torch()).map(|()| {
                if ctx.torch_enabled {
                    "Torch has been disabled".to_owned()
                } else {
                    "Torch successfully turned on".to_owned()
                }
            }),
            Intent::ClearNotifications => self
                .act("clear_notifications", self.actions.clear_notifications())
                .map(|()| "All notifications cleared".to_owned()),
            Intent::ShowVolumePanel => self
                .act("show_volume_panel", self.actions.show_volume_panel())
                .map(|()| "Showing the volume panel.".to_owned()),
            Intent::SetRingerMode { mode } => match self.actions.set_ringer_mode(*mode) {
                Ok(()) => Some(format!("Ringer mode successfully set to {mode} mode")),
                Err(ActionError::Unsupported(reason)) => {
                    info!(%mode, %reason, "ringer mode unsupported");
                    Some(format!("This device does not support {mode} mode."))
                }
                Err(e) => {
                    warn!(%mode, "set_ringer_mode failed: {e}");
                    None
                }
            },
            Intent::LaunchApp { name, freeform } => self.launch_app(name, *freeform),
            Intent::ToggleBluetooth => self
                .act("toggle_bluetooth", self.actions.toggle_bluetooth())
                .map(|()| "Toggling Bluetooth.".to_owned()),
            Intent::BriefQuery { text } => Some(self.remote.query(text, true, &ctx.api_key).await),
            Intent::OpenCompanionAssistant => {
                // The reply stands even when the companion app is missing.
                let _ = self.act("launch_companion_app", self.actions.launch_companion_app());
                Some(COMPANION_REPLY.to_owned())
            }
            Intent::MediaControl { op } => {
                let _ = self.act("media_control", self.actions.media_control(*op));
                None
            }
            Intent::GeneralQuery { text } => {
                Some(self.remote.query(text, false, &ctx.api_key).await)
            }
        }
    }

    fn launch_app(&self, name: &str, freeform: bool) -> Option<String> {
        let Some(entry) = self.catalog.resolve(name) else {
            info!(fragment = %name, "no application matched");
            return Some(UNRESOLVED_APP_REPLY.to_owned());
        };
        match self.actions.launch_app(&entry.package_id, freeform) {
            Ok(()) if freeform => Some(format!("Sure thing! Launching {} in freeform mode", entry.label)),
            Ok(()) => Some(format!("Sure thing! Launching {}", entry.label)),
            Err(ActionError::NoLaunchEntry(package)) => {
                info!(%package, "resolved application has no launch entry");
                Some(format!("App not found: {}", entry.label))
            }
            Err(e) => {
                warn!(package = %entry.package_id, "launch_app failed: {e}");
                None
            }
        }
    }

    fn act(&self, action: &'static str, result: Result<(), ActionError>) -> Option<()> {
        match result {
            Ok(()) => {
                info!(action, "action executed");
                Some(())
            }
            Err(e) => {
                warn!(action, "action failed: {e}");
                None
            }
        }
    }
}
