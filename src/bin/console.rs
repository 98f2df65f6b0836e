//! Interactive console harness for the assistant.
//!
//! Reads lines from stdin and plays the host's part:
//!
//! - `swipe` sends a two-finger swipe down
//! - `unlock` reports the device unlock
//! - `enable` / `disable` flip the assistant toggle in the settings store
//! - `status` prints the session as JSON
//! - `quit` exits
//!
//! Any other line is delivered as the recognizer's transcript when the
//! assistant is listening; lines typed at other times are discarded. Spoken
//! output and device actions go to stdout; tracing goes to stderr.
//!
//! The Gemini key is read from `GEMINI_API_KEY` when set.

use async_trait::async_trait;
use risa::actions::{ActionError, ActionSink};
use risa::catalog::{AppCatalogEntry, StaticCatalog};
use risa::gesture::{GestureEvent, TouchPoint};
use risa::remote::{GeminiBackend, GeminiConfig};
use risa::settings::{self, LocalSettings, SettingsStore};
use risa::speech::{RecognitionError, SpeechToText, SynthesisError, TextToSpeech};
use risa::voice_command::{MediaOp, RingerMode};
use risa::{AssistantConfig, AssistantCoordinator, AssistantHandle, Collaborators, RuntimeEvent};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, broadcast, mpsc};

struct ConsoleSpeaker;

#[async_trait]
impl TextToSpeech for ConsoleSpeaker {
    async fn speak(&self, text: &str) -> Result<(), SynthesisError> {
        println!("risa> {text}");
        Ok(())
    }
}

struct ConsoleRecognizer {
    transcripts: Mutex<mpsc::UnboundedReceiver<String>>,
}

#[async_trait]
impl SpeechToText for ConsoleRecognizer {
    async fn listen(&self) -> Result<String, RecognitionError> {
        let mut rx = self.transcripts.lock().await;
        // Lines typed before the prompt finished are not answers to it.
        let mut stale = 0;
        while rx.try_recv().is_ok() {
            stale += 1;
        }
        if stale > 0 {
            tracing::debug!(stale, "discarded input typed before listening");
        }
        println!("(listening)");
        rx.recv()
            .await
            .ok_or_else(|| RecognitionError::Other("console input closed".to_owned()))
    }
}

#[derive(Default)]
struct ConsoleActions {
    torch: AtomicBool,
    handle: OnceLock<AssistantHandle>,
}

impl ConsoleActions {
    fn report(&self, action: &str) -> Result<(), ActionError> {
        println!("[action] {action}");
        Ok(())
    }
}

impl ActionSink for ConsoleActions {
    fn toggle_torch(&self) -> Result<(), ActionError> {
        let enabled = !self.torch.fetch_xor(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.get() {
            handle.set_torch_enabled(enabled);
        }
        self.report(if enabled { "torch on" } else { "torch off" })
    }

    fn clear_notifications(&self) -> Result<(), ActionError> {
        self.report("clear notifications")
    }

    fn show_volume_panel(&self) -> Result<(), ActionError> {
        self.report("show volume panel")
    }

    fn set_ringer_mode(&self, mode: RingerMode) -> Result<(), ActionError> {
        self.report(&format!("ringer mode {mode}"))
    }

    fn launch_app(&self, package_id: &str, freeform: bool) -> Result<(), ActionError> {
        self.report(&format!("launch {package_id} (freeform: {freeform})"))
    }

    fn toggle_bluetooth(&self) -> Result<(), ActionError> {
        self.report("toggle bluetooth")
    }

    fn media_control(&self, op: MediaOp) -> Result<(), ActionError> {
        self.report(&format!("media {op:?}"))
    }

    fn launch_companion_app(&self) -> Result<(), ActionError> {
        Err(ActionError::NoLaunchEntry("com.openai.chatgpt".to_owned()))
    }
}

fn demo_catalog() -> StaticCatalog {
    StaticCatalog::new(vec![
        AppCatalogEntry::new("Camera", "org.lineageos.aperture"),
        AppCatalogEntry::new("Chrome", "com.android.chrome"),
        AppCatalogEntry::new("Calculator", "com.android.calculator2"),
        AppCatalogEntry::new("Clock", "com.android.deskclock"),
        AppCatalogEntry::new("Maps", "com.google.android.apps.maps"),
        AppCatalogEntry::new("Settings", "com.android.settings"),
        AppCatalogEntry::new("YouTube", "com.google.android.youtube"),
    ])
}

fn load_config() -> anyhow::Result<AssistantConfig> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(AssistantConfig::default_config_path);
    if path.exists() {
        tracing::info!(path = %path.display(), "loading config");
        Ok(AssistantConfig::from_file(&path)?)
    } else {
        tracing::info!(path = %path.display(), "no config file, using defaults");
        Ok(AssistantConfig::default())
    }
}

async fn print_runtime_events(mut rx: broadcast::Receiver<RuntimeEvent>) {
    loop {
        match rx.recv().await {
            Ok(RuntimeEvent::ListeningChanged { active }) => {
                println!("[listening {}]", if active { "on" } else { "off" });
            }
            Ok(RuntimeEvent::AssistantActive { active }) => {
                println!("[assistant {}]", if active { "active" } else { "inactive" });
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout carries the dialogue; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("risa=info")),
        )
        .init();

    let config = load_config()?;
    let settings = Arc::new(match &config.settings_path {
        Some(path) => LocalSettings::open(path)?,
        None => LocalSettings::in_memory(),
    });
    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        settings.put_string(settings::API_KEY_KEY, &key)?;
    }

    let (transcript_tx, transcript_rx) = mpsc::unbounded_channel();
    let actions = Arc::new(ConsoleActions::default());
    let collaborators = Collaborators {
        recognizer: Arc::new(ConsoleRecognizer {
            transcripts: Mutex::new(transcript_rx),
        }),
        speaker: Arc::new(ConsoleSpeaker),
        actions: actions.clone(),
        catalog: Arc::new(demo_catalog()),
        settings: settings.clone(),
        backend: Arc::new(GeminiBackend::new(GeminiConfig::from(&config.remote))),
    };

    let (runtime_tx, runtime_rx) = broadcast::channel(64);
    let coordinator =
        AssistantCoordinator::new(config, collaborators).with_runtime_events(runtime_tx);
    let handle = coordinator.handle();
    let _ = actions.handle.set(handle.clone());
    tokio::spawn(print_runtime_events(runtime_rx));
    let task = tokio::spawn(coordinator.run());

    tracing::info!("risa console ready: swipe, unlock, enable, disable, status, quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        match line.trim() {
            "" => {}
            "quit" | "exit" => break,
            "swipe" => {
                let swipe = GestureEvent::two_finger_move(
                    TouchPoint::new(400.0, 300.0),
                    TouchPoint::new(420.0, 420.0),
                );
                handle.on_pointer_event(&swipe);
            }
            "unlock" => handle.device_unlocked(),
            "enable" => settings.put_bool(settings::ASSISTANT_ENABLED_KEY, true)?,
            "disable" => settings.put_bool(settings::ASSISTANT_ENABLED_KEY, false)?,
            "status" => {
                let session = handle.snapshot().await?;
                println!("{}", serde_json::to_string_pretty(&session)?);
            }
            transcript => {
                let _ = transcript_tx.send(transcript.to_owned());
            }
        }
    }

    handle.shutdown();
    task.await??;
    tracing::info!("risa console shut down cleanly");
    Ok(())
}
