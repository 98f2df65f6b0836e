//! Settings store abstraction and the local implementation.
//!
//! The assistant reads three keys: the feature toggle, the remote API key
//! and the persisted onboarding flag. Hosts publish a [`SettingsChange`]
//! whenever a key changes; the coordinator reduces those into a fresh
//! [`SettingsSnapshot`].

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Feature toggle for the swipe gesture.
pub const ASSISTANT_ENABLED_KEY: &str = "ai_assistant_gesture";
/// Credential for the remote language backend.
pub const API_KEY_KEY: &str = "ai_assistant_gemini_key";
/// Set once the onboarding greeting has played.
pub const ONBOARDING_FINISHED_KEY: &str = "ai_assistant_onboarding_finished";

const CHANGE_CHANNEL_SIZE: usize = 32;

/// A settings key changed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChange {
    pub key: String,
}

/// Host settings store.
pub trait SettingsStore: Send + Sync + 'static {
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_string(&self, key: &str) -> Option<String>;
    fn put_bool(&self, key: &str, value: bool) -> Result<()>;
    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<SettingsChange>;
}

/// Values the assistant derives from the settings store.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub enabled: bool,
    pub api_key: String,
}

impl std::fmt::Debug for SettingsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsSnapshot")
            .field("enabled", &self.enabled)
            .field("api_key", &if self.api_key.is_empty() { "<unset>" } else { "<redacted>" })
            .finish()
    }
}

impl SettingsSnapshot {
    /// Re-read every assistant key from `store`.
    pub fn read(store: &dyn SettingsStore) -> Self {
        Self {
            enabled: store.get_bool(ASSISTANT_ENABLED_KEY).unwrap_or(false),
            api_key: store.get_string(API_KEY_KEY).unwrap_or_default(),
        }
    }
}

/// Whether the onboarding greeting has already played.
pub fn onboarding_finished(store: &dyn SettingsStore) -> bool {
    store.get_bool(ONBOARDING_FINISHED_KEY).unwrap_or(false)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct SettingsValues {
    flags: BTreeMap<String, bool>,
    strings: BTreeMap<String, String>,
}

/// In-process settings store, optionally persisted to a TOML file.
pub struct LocalSettings {
    values: Mutex<SettingsValues>,
    path: Option<PathBuf>,
    change_tx: broadcast::Sender<SettingsChange>,
}

impl std::fmt::Debug for LocalSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSettings")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl LocalSettings {
    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);
        Self {
            values: Mutex::new(SettingsValues::default()),
            path: None,
            change_tx,
        }
    }

    /// Store backed by `path`, loading existing values when the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: &Path) -> Result<Self> {
        let values = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| AssistantError::Settings(e.to_string()))?
        } else {
            SettingsValues::default()
        };
        let (change_tx, _) = broadcast::channel(CHANGE_CHANNEL_SIZE);
        Ok(Self {
            values: Mutex::new(values),
            path: Some(path.to_path_buf()),
            change_tx,
        })
    }

    /// Set a string value (e.g. the API key) and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting the new value fails.
    pub fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.update(key, |values| {
            values.strings.insert(key.to_owned(), value.to_owned());
        })
    }

    fn update(&self, key: &str, apply: impl FnOnce(&mut SettingsValues)) -> Result<()> {
        let snapshot = {
            let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
            apply(&mut values);
            values.clone()
        };
        if let Some(path) = &self.path {
            persist(path, &snapshot)?;
        }
        debug!(key, "setting changed");
        // No subscribers is fine.
        let _ = self.change_tx.send(SettingsChange {
            key: key.to_owned(),
        });
        Ok(())
    }
}

fn persist(path: &Path, values: &SettingsValues) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content =
        toml::to_string_pretty(values).map_err(|e| AssistantError::Settings(e.to_string()))?;
    std::fs::write(path, content).map_err(|e| {
        warn!(path = %path.display(), "failed to persist settings: {e}");
        AssistantError::Io(e)
    })
}

impl SettingsStore for LocalSettings {
    fn get_bool(&self, key: &str) -> Option<bool> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.flags.get(key).copied()
    }

    fn get_string(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.strings.get(key).cloned()
    }

    fn put_bool(&self, key: &str, value: bool) -> Result<()> {
        self.update(key, |values| {
            values.flags.insert(key.to_owned(), value);
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<SettingsChange> {
        self.change_tx.subscribe()
    }
}
