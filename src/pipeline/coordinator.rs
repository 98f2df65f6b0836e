//! The interaction state machine.
//!
//! [`AssistantCoordinator::run`] owns the [`Session`] and is its only writer.
//! Host calls made through [`AssistantHandle`], settings notifications and
//! completions of spawned work (speech, timers, recognition, dispatch) are
//! funnelled into one loop, so transitions are serialized without locks.
//!
//! ```text
//! swipe ──▶ SpeakingPrompt ──prompt done──▶ AwaitingSpeechStart ──delay──▶ Listening
//!                                                                            │
//!   Idle ◀──reply done── SpeakingResult ◀──reply── Processing ◀──result/error┘
//! ```

use crate::actions::ActionSink;
use crate::catalog::{AppCatalog, ApplicationCatalog};
use crate::config::{AssistantConfig, GestureConfig};
use crate::error::{AssistantError, Result};
use crate::gesture::{GestureEvent, is_swipe_down};
use crate::onboarding::{OnboardingStatus, OnboardingStep};
use crate::pipeline::dispatch::{CommandDispatcher, DispatchContext};
use crate::pipeline::messages::{CoordinatorEvent, SpeechPurpose};
use crate::remote::{LanguageBackend, RemoteQueryAdapter};
use crate::runtime::RuntimeEvent;
use crate::session::{Phase, Session};
use crate::settings::{self, SettingsChange, SettingsSnapshot, SettingsStore};
use crate::speech::{RecognitionError, SpeechToText, TextToSpeech};
use crate::voice_command::classify;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Host engines and services the coordinator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub recognizer: Arc<dyn SpeechToText>,
    pub speaker: Arc<dyn TextToSpeech>,
    pub actions: Arc<dyn ActionSink>,
    pub catalog: Arc<dyn ApplicationCatalog>,
    pub settings: Arc<dyn SettingsStore>,
    pub backend: Arc<dyn LanguageBackend>,
}

/// Cloneable entry point for host callbacks.
#[derive(Debug, Clone)]
pub struct AssistantHandle {
    tx: mpsc::UnboundedSender<CoordinatorEvent>,
    gesture: GestureConfig,
}

impl AssistantHandle {
    /// Feed one pointer sample. Returns whether it was a swipe down.
    ///
    /// Classification is a pure predicate and the hand-off never blocks, so
    /// this is safe to call from the input delivery path. Whether the swipe
    /// opens a dialogue is decided by the coordinator.
    pub fn on_pointer_event(&self, event: &GestureEvent) -> bool {
        if !is_swipe_down(event, &self.gesture) {
            return false;
        }
        // A closed channel means the coordinator has shut down.
        let _ = self.tx.send(CoordinatorEvent::SwipeDown);
        true
    }

    /// Latch the unlocked flag. Repeated calls are no-ops.
    pub fn device_unlocked(&self) {
        let _ = self.tx.send(CoordinatorEvent::Unlocked);
    }

    /// Report the current torch state.
    pub fn set_torch_enabled(&self, enabled: bool) {
        let _ = self.tx.send(CoordinatorEvent::TorchState { enabled });
    }

    /// Copy of the current session.
    ///
    /// # Errors
    ///
    /// Returns [`AssistantError::Channel`] if the coordinator is not running.
    pub async fn snapshot(&self) -> Result<Session> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(CoordinatorEvent::Snapshot { reply })
            .map_err(|_| AssistantError::Channel("coordinator stopped".to_owned()))?;
        rx.await
            .map_err(|_| AssistantError::Channel("coordinator dropped snapshot request".to_owned()))
    }

    /// Stop the coordinator. Pending timers and speech are abandoned.
    pub fn shutdown(&self) {
        let _ = self.tx.send(CoordinatorEvent::Shutdown);
    }
}

/// Owns the session and runs the dialogue.
pub struct AssistantCoordinator {
    config: AssistantConfig,
    collaborators: Collaborators,
    dispatcher: Arc<CommandDispatcher>,
    cancel: CancellationToken,
    runtime_tx: Option<broadcast::Sender<RuntimeEvent>>,
    tx: mpsc::UnboundedSender<CoordinatorEvent>,
    rx: mpsc::UnboundedReceiver<CoordinatorEvent>,
    session: Session,
    api_key: String,
    greeting_open: bool,
    /// The greeting played but its flag could not be stored.
    greeting_unsaved: bool,
}

impl AssistantCoordinator {
    /// Build a coordinator. The application catalog is captured here and
    /// not refreshed afterwards.
    pub fn new(config: AssistantConfig, collaborators: Collaborators) -> Self {
        let catalog = AppCatalog::snapshot(collaborators.catalog.as_ref());
        let remote = RemoteQueryAdapter::new(Arc::clone(&collaborators.backend), &config.remote);
        let dispatcher = Arc::new(CommandDispatcher::new(
            Arc::clone(&collaborators.actions),
            catalog,
            remote,
        ));
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            collaborators,
            dispatcher,
            cancel: CancellationToken::new(),
            runtime_tx: None,
            tx,
            rx,
            session: Session::default(),
            api_key: String::new(),
            greeting_open: false,
            greeting_unsaved: false,
        }
    }

    /// Attach a runtime event broadcaster for status indicators.
    pub fn with_runtime_events(mut self, tx: broadcast::Sender<RuntimeEvent>) -> Self {
        self.runtime_tx = Some(tx);
        self
    }

    /// Use an externally owned cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn handle(&self) -> AssistantHandle {
        AssistantHandle {
            tx: self.tx.clone(),
            gesture: self.config.gesture.clone(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run until [`AssistantHandle::shutdown`] or cancellation.
    ///
    /// # Errors
    ///
    /// Currently infallible; the signature leaves room for hosts that fail
    /// to attach.
    pub async fn run(mut self) -> Result<()> {
        info!(
            apps = self.dispatcher.catalog().len(),
            "assistant coordinator started"
        );
        let mut settings_rx = Some(self.collaborators.settings.subscribe());
        self.reload_settings();

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                event = self.rx.recv() => {
                    let Some(event) = event else { break };
                    if matches!(event, CoordinatorEvent::Shutdown) {
                        break;
                    }
                    self.handle_event(event);
                }
                change = recv_change(&mut settings_rx), if settings_rx.is_some() => {
                    match change {
                        Ok(change) => {
                            debug!(key = %change.key, "settings changed");
                            self.reload_settings();
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            debug!(missed, "settings notifications lagged, re-reading");
                            self.reload_settings();
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("settings store stopped publishing changes");
                            settings_rx = None;
                        }
                    }
                }
            }
        }

        self.cancel.cancel();
        self.close_open_brackets();
        info!("assistant coordinator stopped");
        Ok(())
    }

    fn handle_event(&mut self, event: CoordinatorEvent) {
        match event {
            CoordinatorEvent::SwipeDown => self.on_swipe(),
            CoordinatorEvent::Unlocked => {
                if !self.session.unlocked {
                    info!("device unlocked, gesture armed");
                    self.session.unlocked = true;
                }
            }
            CoordinatorEvent::TorchState { enabled } => self.session.torch_enabled = enabled,
            CoordinatorEvent::Snapshot { reply } => {
                let _ = reply.send(self.session.clone());
            }
            CoordinatorEvent::Shutdown => {}
            CoordinatorEvent::SpeechFinished {
                generation,
                purpose,
                result,
            } => {
                if generation != self.session.generation {
                    debug!(generation, "stale speech completion dropped");
                    return;
                }
                if let Err(e) = &result {
                    warn!(?purpose, "speech synthesis failed: {e}");
                }
                match purpose {
                    SpeechPurpose::Prompt => self.on_prompt_finished(result.is_ok()),
                    SpeechPurpose::Reply => {
                        if self.session.phase == Phase::SpeakingResult {
                            self.finish_dialogue();
                        }
                    }
                    SpeechPurpose::Greeting => self.end_onboarding(),
                }
            }
            CoordinatorEvent::ListenDelayElapsed { generation } => {
                if generation == self.session.generation
                    && self.session.phase == Phase::AwaitingSpeechStart
                {
                    self.start_listening();
                }
            }
            CoordinatorEvent::Recognized { generation, result } => {
                if generation == self.session.generation && self.session.phase == Phase::Listening {
                    self.on_recognized(result);
                }
            }
            CoordinatorEvent::Dispatched { generation, reply } => {
                if generation == self.session.generation && self.session.phase == Phase::Processing {
                    match reply {
                        Some(text) => self.speak_reply(text),
                        None => self.finish_dialogue(),
                    }
                }
            }
            CoordinatorEvent::GreetingTimeout { generation } => {
                if generation == self.session.generation {
                    debug!("greeting broadcast timed out");
                    self.end_onboarding();
                }
            }
        }
    }

    fn on_swipe(&mut self) {
        if !self.session.accepts_swipe() {
            debug!(
                enabled = self.session.enabled,
                unlocked = self.session.unlocked,
                phase = %self.session.phase,
                "swipe ignored"
            );
            return;
        }
        let generation = self.session.next_generation();
        info!(generation, "swipe down, opening dialogue");
        self.set_phase(Phase::SpeakingPrompt);
        self.emit(RuntimeEvent::ListeningChanged { active: true });
        let prompt = self.config.dialogue.prompt.clone();
        self.speak(prompt, SpeechPurpose::Prompt);
    }

    fn on_prompt_finished(&mut self, ok: bool) {
        if self.session.phase != Phase::SpeakingPrompt {
            return;
        }
        if !ok {
            self.finish_dialogue();
            return;
        }
        self.set_phase(Phase::AwaitingSpeechStart);
        let generation = self.session.generation;
        self.after(self.config.timing.listen_delay(), move || {
            CoordinatorEvent::ListenDelayElapsed { generation }
        });
    }

    fn start_listening(&mut self) {
        self.set_phase(Phase::Listening);
        let generation = self.session.generation;
        let recognizer = Arc::clone(&self.collaborators.recognizer);
        let tx = self.tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                result = recognizer.listen() => {
                    let _ = tx.send(CoordinatorEvent::Recognized { generation, result });
                }
            }
        });
    }

    fn on_recognized(&mut self, result: std::result::Result<String, RecognitionError>) {
        self.set_phase(Phase::Processing);
        let transcript = match result.map(|t| t.trim().to_owned()) {
            Ok(t) if !t.is_empty() => t,
            Ok(_) => return self.speak_reply(RecognitionError::NoMatch.fallback_reply().to_owned()),
            Err(e) => {
                info!("recognition failed: {e}");
                return self.speak_reply(e.fallback_reply().to_owned());
            }
        };

        info!(transcript = %transcript, "recognized");
        self.session.last_transcript = Some(transcript.clone());
        self.emit(RuntimeEvent::Transcription {
            text: transcript.clone(),
        });

        let intent = classify(&transcript);
        info!(?intent, "classified");
        self.emit(RuntimeEvent::IntentClassified {
            intent: intent.clone(),
        });

        let ctx = DispatchContext {
            torch_enabled: self.session.torch_enabled,
            api_key: self.api_key.clone(),
        };
        let generation = self.session.generation;
        let dispatcher = Arc::clone(&self.dispatcher);
        let tx = self.tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                reply = dispatcher.execute(&intent, &ctx) => {
                    let _ = tx.send(CoordinatorEvent::Dispatched { generation, reply });
                }
            }
        });
    }

    fn speak_reply(&mut self, text: String) {
        self.set_phase(Phase::SpeakingResult);
        self.speak(text, SpeechPurpose::Reply);
    }

    /// Single exit of every dialogue: back to idle and close the listening
    /// bracket, then run a deferred greeting if one is waiting.
    fn finish_dialogue(&mut self) {
        if !self.session.phase.in_dialogue() {
            return;
        }
        self.set_phase(Phase::Idle);
        self.emit(RuntimeEvent::ListeningChanged { active: false });
        info!(generation = self.session.generation, "dialogue finished");
        self.evaluate_onboarding();
    }

    fn reload_settings(&mut self) {
        let snapshot = SettingsSnapshot::read(self.collaborators.settings.as_ref());
        debug!(?snapshot, "settings reloaded");
        if snapshot.enabled != self.session.enabled {
            info!(enabled = snapshot.enabled, "assistant toggled");
        }
        self.session.enabled = snapshot.enabled;
        self.api_key = snapshot.api_key;
        self.evaluate_onboarding();
    }

    fn evaluate_onboarding(&mut self) {
        let persisted = self.greeting_unsaved
            || settings::onboarding_finished(self.collaborators.settings.as_ref());
        let idle = self.session.phase == Phase::Idle;
        match self
            .session
            .onboarding
            .next_step(self.session.enabled, persisted, idle)
        {
            OnboardingStep::Start => self.start_onboarding(),
            OnboardingStep::Defer => {
                debug!("onboarding deferred until the dialogue ends");
                self.session.onboarding = OnboardingStatus::Deferred;
            }
            OnboardingStep::AlreadyDone => self.session.onboarding = OnboardingStatus::Finished,
            OnboardingStep::Nothing => {}
        }
    }

    fn start_onboarding(&mut self) {
        let generation = self.session.next_generation();
        info!(generation, "playing onboarding greeting");
        self.session.onboarding = OnboardingStatus::Playing;
        self.set_phase(Phase::Onboarding);
        self.greeting_open = true;
        self.emit(RuntimeEvent::AssistantActive { active: true });

        let greeting = self.config.dialogue.greeting.clone();
        self.speak(greeting, SpeechPurpose::Greeting);

        if let Err(e) = self
            .collaborators
            .settings
            .put_bool(settings::ONBOARDING_FINISHED_KEY, true)
        {
            warn!("failed to persist onboarding flag: {e}");
            self.greeting_unsaved = true;
        }

        self.after(self.config.timing.greeting_timeout(), move || {
            CoordinatorEvent::GreetingTimeout { generation }
        });
    }

    /// Close the greeting bracket exactly once, on completion or timeout,
    /// whichever comes first.
    fn end_onboarding(&mut self) {
        if self.session.phase != Phase::Onboarding {
            return;
        }
        self.greeting_open = false;
        self.emit(RuntimeEvent::AssistantActive { active: false });
        self.session.onboarding = OnboardingStatus::Finished;
        self.set_phase(Phase::Idle);
    }

    fn close_open_brackets(&mut self) {
        if self.session.phase.in_dialogue() {
            self.emit(RuntimeEvent::ListeningChanged { active: false });
        }
        if self.greeting_open {
            self.greeting_open = false;
            self.emit(RuntimeEvent::AssistantActive { active: false });
        }
        self.set_phase(Phase::Idle);
    }

    fn set_phase(&mut self, to: Phase) {
        let from = self.session.phase;
        if from == to {
            return;
        }
        debug!(%from, %to, "phase transition");
        self.session.phase = to;
        self.emit(RuntimeEvent::PhaseChanged { from, to });
    }

    fn speak(&self, text: String, purpose: SpeechPurpose) {
        self.emit(RuntimeEvent::Spoken { text: text.clone() });
        let generation = self.session.generation;
        let speaker = Arc::clone(&self.collaborators.speaker);
        let tx = self.tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                result = speaker.speak(&text) => {
                    let _ = tx.send(CoordinatorEvent::SpeechFinished { generation, purpose, result });
                }
            }
        });
    }

    /// Fire-once timer, abandoned on shutdown.
    fn after(&self, delay: Duration, event: impl FnOnce() -> CoordinatorEvent + Send + 'static) {
        let tx = self.tx.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = cancel.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    let _ = tx.send(event());
                }
            }
        });
    }

    fn emit(&self, event: RuntimeEvent) {
        if let Some(tx) = &self.runtime_tx {
            // No subscribers is fine.
            let _ = tx.send(event);
        }
    }
}

async fn recv_change(
    rx: &mut Option<broadcast::Receiver<SettingsChange>>,
) -> std::result::Result<SettingsChange, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
