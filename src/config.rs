//! Configuration types for the assistant.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for the assistant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Where [`crate::settings::LocalSettings`] persists its values
    /// (None = in memory only).
    pub settings_path: Option<PathBuf>,
    /// Swipe gesture thresholds.
    pub gesture: GestureConfig,
    /// Dialogue timers.
    pub timing: TimingConfig,
    /// Fixed spoken lines.
    pub dialogue: DialogueConfig,
    /// Remote language backend settings.
    pub remote: RemoteConfig,
}

/// Swipe-down gesture thresholds, in input units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// The second touch point must be more than this far below the first.
    pub min_vertical_drop: f32,
    /// Horizontal distance between the two points must stay below this.
    pub max_horizontal_spread: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            min_vertical_drop: 50.0,
            max_horizontal_spread: 300.0,
        }
    }
}

/// Fire-once dialogue timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause between the end of the prompt and starting the recognizer.
    pub listen_delay_ms: u64,
    /// Longest the onboarding "assistant active" broadcast stays open if the
    /// greeting never reports completion.
    pub greeting_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            listen_delay_ms: 250,
            greeting_timeout_ms: 8_000,
        }
    }
}

impl TimingConfig {
    pub fn listen_delay(&self) -> Duration {
        Duration::from_millis(self.listen_delay_ms)
    }

    pub fn greeting_timeout(&self) -> Duration {
        Duration::from_millis(self.greeting_timeout_ms)
    }
}

/// Fixed lines spoken outside of command replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Spoken when a swipe opens a session.
    pub prompt: String,
    /// Spoken once, the first time the assistant is enabled.
    pub greeting: String,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            prompt: "Hi, what can I do for you?".to_owned(),
            greeting: crate::onboarding::DEFAULT_GREETING.to_owned(),
        }
    }
}

/// Remote language backend settings.
///
/// The API key is not part of this file; it is read from the settings store
/// so it can change at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the generative language API.
    pub base_url: String,
    /// Model identifier used in the `generateContent` path.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Instruction prepended to brief queries.
    pub brief_prefix: String,
    /// Spoken instead of an answer whenever the backend fails.
    pub fallback_answer: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_owned(),
            model: "gemini-1.5-flash-latest".to_owned(),
            timeout_secs: 30,
            brief_prefix: "Please provide a brief summary: ".to_owned(),
            fallback_answer: "Sorry, I'm having trouble staying in touch with Gemini.".to_owned(),
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl AssistantConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::AssistantError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/risa/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("risa").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("risa")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/risa-config/config.toml")
        }
    }
}
