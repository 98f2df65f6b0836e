//! Intent classification for recognized utterances.
//!
//! Rules match against a punctuation-free copy of the transcript and are
//! tested in table order. The first rule whose predicate matches builds the
//! intent; anything no rule claims becomes a [`Intent::GeneralQuery`], so
//! classification always produces an intent. Query intents carry the
//! case-folded transcript with its punctuation intact, so "2.5" reaches the
//! remote backend as spoken.
//!
//! # Supported Commands
//!
//! | Priority | Phrase Pattern | Intent |
//! |---|---|---|
//! | 1 | "turn on/off ..." + "torch"/"flashlight" | `ToggleTorch` |
//! | 2 | "clear all notifications" | `ClearNotifications` |
//! | 3 | "show volume" | `ShowVolumePanel` |
//! | 4 | "silent" / "vibrate" / "normal" | `SetRingerMode` |
//! | 5 | starts with "open {app}" / "launch {app}" [in freeform] | `LaunchApp` |
//! | 6 | "turn on/off ..." + "bluetooth" | `ToggleBluetooth` |
//! | 7 | starts with what/when/why/who/where/how | `BriefQuery` |
//! | 8 | "chat gpt" | `OpenCompanionAssistant` |
//! | 9 | playback verb + "song"/"music"/"media" | `MediaControl` |
//! | - | anything else | `GeneralQuery` |

use std::fmt;

/// Ringer mode requested by voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingerMode {
    Silent,
    Vibrate,
    Normal,
}

impl RingerMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Vibrate => "vibrate",
            Self::Normal => "normal",
        }
    }
}

impl fmt::Display for RingerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media session control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaOp {
    Play,
    Pause,
    Next,
    Previous,
}

/// An action classified from user speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Flip the torch. Direction comes from the host's torch state, not the words.
    ToggleTorch,
    /// Dismiss every notification.
    ClearNotifications,
    /// Show the system volume panel.
    ShowVolumePanel,
    /// Switch the ringer mode.
    SetRingerMode { mode: RingerMode },
    /// Launch an installed application.
    LaunchApp {
        /// Raw spoken fragment naming the application (not yet resolved).
        name: String,
        /// Launch in a freeform window.
        freeform: bool,
    },
    /// Toggle Bluetooth.
    ToggleBluetooth,
    /// Short factual question answered by the remote backend.
    BriefQuery { text: String },
    /// Hand over to the companion assistant app.
    OpenCompanionAssistant,
    /// Control the active media session.
    MediaControl { op: MediaOp },
    /// Anything else, answered by the remote backend.
    GeneralQuery { text: String },
}

/// A transcript prepared for classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Case-folded, whitespace-collapsed transcript. Punctuation is kept.
    pub text: String,
    /// [`normalize`]d form the rule predicates match against.
    pub words: String,
}

impl Utterance {
    #[must_use]
    pub fn new(transcript: &str) -> Self {
        Self {
            text: fold(transcript),
            words: normalize(transcript),
        }
    }
}

/// One classification rule: a predicate over the normalized transcript and
/// the builder that runs when it matches.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub matches: fn(&str) -> bool,
    pub build: fn(&Utterance) -> Intent,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

const TOGGLE_PHRASES: &[&str] = &["turn on", "turn off", "switch on", "switch off", "toggle"];
const TORCH_TARGETS: &[&str] = &["torch", "flashlight", "flash light"];
const CLEAR_NOTIFICATION_PHRASES: &[&str] = &[
    "clear all notifications",
    "clear notifications",
    "clear my notifications",
];
const VOLUME_PANEL_PHRASES: &[&str] = &["show volume panel", "show volume", "show the volume"];
const RINGER_MODES: &[(&str, RingerMode)] = &[
    ("silent", RingerMode::Silent),
    ("vibrate", RingerMode::Vibrate),
    ("normal", RingerMode::Normal),
];
const LAUNCH_TRIGGERS: &[&str] = &["open", "launch"];
const LAUNCH_STOP_WORDS: &[&str] = &["in", "free", "form"];
const FREEFORM_PHRASES: &[&str] = &["in free form", "in freeform"];
const BLUETOOTH_TOGGLES: &[&str] = &[
    "turn on", "turn off", "switch on", "switch off", "toggle", "enable", "disable",
];
const QUESTION_OPENERS: &[&str] = &["what", "when", "why", "who", "where", "how"];
const COMPANION_PHRASES: &[&str] = &["chat gpt", "chatgpt"];
const MEDIA_VERBS: &[&str] = &["play", "stop", "pause", "skip", "next", "previous", "return"];
const MEDIA_NOUNS: &[&str] = &["song", "music", "media"];
/// Checked in order. `Play` comes first, so "play the next song" plays.
const MEDIA_TIERS: &[(MediaOp, &[&str])] = &[
    (MediaOp::Play, &["play"]),
    (MediaOp::Pause, &["stop", "pause", "halt"]),
    (MediaOp::Next, &["next", "skip", "fast forward"]),
    (MediaOp::Previous, &["previous", "return", "last"]),
];

/// Classification rules in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "torch",
        matches: is_torch_command,
        build: |_| Intent::ToggleTorch,
    },
    Rule {
        name: "clear_notifications",
        matches: |t| contains_any(t, CLEAR_NOTIFICATION_PHRASES),
        build: |_| Intent::ClearNotifications,
    },
    Rule {
        name: "volume_panel",
        matches: |t| contains_any(t, VOLUME_PANEL_PHRASES),
        build: |_| Intent::ShowVolumePanel,
    },
    Rule {
        name: "ringer_mode",
        matches: |t| ringer_mode(t).is_some(),
        build: build_ringer_mode,
    },
    Rule {
        name: "launch_app",
        matches: starts_with_launch_trigger,
        build: build_launch_app,
    },
    Rule {
        name: "bluetooth",
        matches: |t| t.contains("bluetooth") && contains_any(t, BLUETOOTH_TOGGLES),
        build: |_| Intent::ToggleBluetooth,
    },
    Rule {
        name: "brief_query",
        matches: starts_with_question,
        build: |u| Intent::BriefQuery {
            text: u.text.clone(),
        },
    },
    Rule {
        name: "companion_assistant",
        matches: |t| contains_any(t, COMPANION_PHRASES),
        build: |_| Intent::OpenCompanionAssistant,
    },
    Rule {
        name: "media_control",
        matches: |t| contains_any(t, MEDIA_VERBS) && contains_any(t, MEDIA_NOUNS),
        build: build_media_control,
    },
];

/// Classify a raw transcript into an intent.
///
/// # Examples
///
/// ```
/// use risa::voice_command::{Intent, MediaOp, classify};
///
/// assert_eq!(classify("Turn on torch"), Intent::ToggleTorch);
/// assert_eq!(classify("skip this song"), Intent::MediaControl { op: MediaOp::Next });
/// assert_eq!(
///     classify("tell me a joke"),
///     Intent::GeneralQuery { text: "tell me a joke".to_owned() }
/// );
/// ```
#[must_use]
pub fn classify(transcript: &str) -> Intent {
    let utterance = Utterance::new(transcript);
    match RULES.iter().find(|rule| (rule.matches)(&utterance.words)) {
        Some(rule) => (rule.build)(&utterance),
        None => Intent::GeneralQuery {
            text: utterance.text,
        },
    }
}

/// Name of the first rule that claims `transcript`, or `None` for the
/// general fallback.
#[must_use]
pub fn matching_rule(transcript: &str) -> Option<&'static str> {
    let text = normalize(transcript);
    RULES
        .iter()
        .find(|rule| (rule.matches)(&text))
        .map(|rule| rule.name)
}

/// Lower-case and collapse whitespace, keeping every other character.
#[must_use]
pub fn fold(transcript: &str) -> String {
    transcript
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-case, drop punctuation the recognizer inserts, and collapse
/// whitespace. Apostrophes are kept so "what's" stays one word.
#[must_use]
pub fn normalize(transcript: &str) -> String {
    transcript
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '\'')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

fn is_torch_command(text: &str) -> bool {
    contains_any(text, TOGGLE_PHRASES) && contains_any(text, TORCH_TARGETS)
}

fn ringer_mode(text: &str) -> Option<RingerMode> {
    RINGER_MODES
        .iter()
        .find(|(token, _)| text.contains(token))
        .map(|(_, mode)| *mode)
}

fn build_ringer_mode(utterance: &Utterance) -> Intent {
    // The predicate guarantees a mode token is present.
    let mode = ringer_mode(&utterance.words).unwrap_or(RingerMode::Normal);
    Intent::SetRingerMode { mode }
}

fn starts_with_launch_trigger(text: &str) -> bool {
    text.split(' ')
        .next()
        .is_some_and(|first| LAUNCH_TRIGGERS.contains(&first))
}

fn build_launch_app(utterance: &Utterance) -> Intent {
    let text = utterance.words.as_str();
    let name = text
        .split(' ')
        .skip(1)
        .take_while(|w| !LAUNCH_STOP_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ");
    Intent::LaunchApp {
        name,
        freeform: contains_any(text, FREEFORM_PHRASES),
    }
}

fn starts_with_question(text: &str) -> bool {
    let Some(first) = text.split(' ').next() else {
        return false;
    };
    let stem = first.split('\'').next().unwrap_or(first);
    QUESTION_OPENERS.contains(&stem)
}

fn build_media_control(utterance: &Utterance) -> Intent {
    let op = MEDIA_TIERS
        .iter()
        .find(|(_, verbs)| contains_any(&utterance.words, verbs))
        .map_or(MediaOp::Play, |(op, _)| *op);
    Intent::MediaControl { op }
}
