//! End-to-end dialogue scenarios against the coordinator with fake
//! collaborators.

use crate::helpers::{Harness, Setup, listening_changes};
use risa::remote::RemoteError;
use risa::settings::{self, SettingsStore};
use risa::speech::RecognitionError;
use risa::{Phase, RuntimeEvent};

const PROMPT: &str = "Hi, what can I do for you?";
const FALLBACK: &str = "Sorry, I'm having trouble staying in touch with Gemini.";

fn phases(events: &[RuntimeEvent]) -> Vec<Phase> {
    events
        .iter()
        .filter_map(|e| match e {
            RuntimeEvent::PhaseChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn clear_notifications_round_trip() {
    let mut h = Harness::start(Setup::saying("clear all notifications")).await;

    assert!(h.swipe());
    let events = h.until_dialogue_ends().await;

    assert_eq!(listening_changes(&events), [true, false]);
    assert_eq!(
        phases(&events),
        [
            Phase::SpeakingPrompt,
            Phase::AwaitingSpeechStart,
            Phase::Listening,
            Phase::Processing,
            Phase::SpeakingResult,
            Phase::Idle,
        ]
    );
    assert!(events.contains(&RuntimeEvent::IntentClassified {
        intent: risa::Intent::ClearNotifications
    }));
    assert_eq!(h.actions.calls(), ["clear_notifications"]);
    assert_eq!(h.speaker.spoken(), [PROMPT, "All notifications cleared"]);

    let session = h.handle.snapshot().await.unwrap();
    assert_eq!(session.phase, Phase::Idle);
    assert_eq!(session.last_transcript.as_deref(), Some("clear all notifications"));

    let tail = h.shutdown().await;
    assert!(listening_changes(&tail).is_empty());
}

#[tokio::test]
async fn network_error_apologises_without_acting() {
    let mut h = Harness::start(Setup {
        transcripts: vec![Err(RecognitionError::Network)],
        ..Setup::default()
    })
    .await;

    h.swipe();
    let events = h.until_dialogue_ends().await;

    assert_eq!(listening_changes(&events), [true, false]);
    assert!(h.actions.calls().is_empty());
    assert_eq!(
        h.speaker.spoken(),
        [PROMPT, "Network error. Please check your connection."]
    );
    h.shutdown().await;
}

#[tokio::test]
async fn no_match_and_empty_transcript_share_apology() {
    let mut h = Harness::start(Setup {
        transcripts: vec![Err(RecognitionError::NoMatch), Ok("   ".to_owned())],
        ..Setup::default()
    })
    .await;

    for _ in 0..2 {
        h.swipe();
        h.until_dialogue_ends().await;
    }

    let spoken = h.speaker.spoken();
    assert_eq!(spoken.len(), 4);
    assert_eq!(spoken[1], "I didn't catch that. Please try again.");
    assert_eq!(spoken[3], spoken[1]);
    assert!(h.actions.calls().is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn other_recognition_error_gets_generic_reply() {
    let mut h = Harness::start(Setup {
        transcripts: vec![Err(RecognitionError::Other("engine busy".to_owned()))],
        ..Setup::default()
    })
    .await;

    h.swipe();
    h.until_dialogue_ends().await;
    assert_eq!(
        h.speaker.spoken()[1],
        "Sorry, something went wrong. Please try again."
    );
    h.shutdown().await;
}

#[tokio::test]
async fn second_swipe_during_prompt_is_ignored() {
    let mut h = Harness::start(Setup {
        gated_speaker: true,
        ..Setup::saying("clear all notifications")
    })
    .await;

    assert!(h.swipe());
    assert!(h.swipe());
    let session = h.wait_for(|s| s.phase == Phase::SpeakingPrompt).await;
    assert_eq!(session.generation, 1);

    h.speaker.release(2);
    let events = h.until_dialogue_ends().await;

    assert_eq!(listening_changes(&events), [true, false]);
    assert_eq!(h.actions.calls(), ["clear_notifications"]);
    assert_eq!(h.recognizer.calls(), 1);
    assert_eq!(h.handle.snapshot().await.unwrap().generation, 1);
    h.shutdown().await;
}

#[tokio::test]
async fn disabled_assistant_ignores_swipe() {
    let mut h = Harness::start(Setup {
        enabled: false,
        ..Setup::saying("clear all notifications")
    })
    .await;

    assert!(h.swipe(), "the gesture itself is still recognized");
    let session = h.handle.snapshot().await.unwrap();
    assert_eq!(session.phase, Phase::Idle);
    assert_eq!(session.generation, 0);
    assert!(h.speaker.spoken().is_empty());
    assert!(h.drain().is_empty());
    h.shutdown().await;
}

#[tokio::test]
async fn swipe_waits_for_first_unlock() {
    let mut h = Harness::start(Setup {
        unlocked: false,
        ..Setup::saying("show volume")
    })
    .await;

    h.swipe();
    assert_eq!(h.handle.snapshot().await.unwrap().generation, 0);

    h.handle.device_unlocked();
    h.swipe();
    h.until_dialogue_ends().await;
    assert_eq!(h.actions.calls(), ["show_volume_panel"]);
    assert_eq!(h.speaker.spoken()[1], "Showing the volume panel.");
    h.shutdown().await;
}

#[tokio::test]
async fn disabling_at_runtime_stops_new_dialogues() {
    let h = Harness::start(Setup::saying("clear all notifications")).await;

    h.settings
        .put_bool(settings::ASSISTANT_ENABLED_KEY, false)
        .unwrap();
    h.wait_for(|s| !s.enabled).await;

    h.swipe();
    assert_eq!(h.handle.snapshot().await.unwrap().phase, Phase::Idle);
    assert_eq!(h.recognizer.calls(), 0);
    h.shutdown().await;
}

#[tokio::test]
async fn prompt_synthesis_failure_returns_to_idle() {
    let mut h = Harness::start(Setup {
        failing_speaker: true,
        ..Setup::saying("clear all notifications")
    })
    .await;

    h.swipe();
    let events = h.until_dialogue_ends().await;

    assert_eq!(listening_changes(&events), [true, false]);
    assert_eq!(h.recognizer.calls(), 0);
    assert!(h.actions.calls().is_empty());
    assert_eq!(h.handle.snapshot().await.unwrap().phase, Phase::Idle);
    h.shutdown().await;
}

#[tokio::test]
async fn launch_resolves_misheard_app_name() {
    let mut h = Harness::start(Setup::saying("Open chroem in freeform")).await;

    h.swipe();
    h.until_dialogue_ends().await;

    assert_eq!(h.actions.calls(), ["launch_app:com.android.chrome:true"]);
    assert_eq!(
        h.speaker.spoken()[1],
        "Sure thing! Launching chrome in freeform mode"
    );
    h.shutdown().await;
}

#[tokio::test]
async fn unknown_app_is_reported() {
    let mut h = Harness::start(Setup::saying("open zzz")).await;

    h.swipe();
    h.until_dialogue_ends().await;

    assert!(h.actions.calls().is_empty());
    assert_eq!(
        h.speaker.spoken()[1],
        "Sorry, I couldn't identify the application."
    );
    h.shutdown().await;
}

#[tokio::test]
async fn torch_reply_uses_reported_state() {
    let mut h = Harness::start(Setup::saying("turn off the torch")).await;
    h.handle.set_torch_enabled(true);

    h.swipe();
    h.until_dialogue_ends().await;

    assert_eq!(h.actions.calls(), ["toggle_torch"]);
    assert_eq!(h.speaker.spoken()[1], "Torch has been disabled");
    h.shutdown().await;
}

#[tokio::test]
async fn media_control_ends_silently() {
    let mut h = Harness::start(Setup::saying("skip this song")).await;

    h.swipe();
    let events = h.until_dialogue_ends().await;

    assert_eq!(listening_changes(&events), [true, false]);
    assert_eq!(h.actions.calls(), ["media_control:Next"]);
    assert_eq!(h.speaker.spoken(), [PROMPT]);
    h.shutdown().await;
}

#[tokio::test]
async fn general_query_is_answered_remotely() {
    let mut h = Harness::start(Setup::saying("tell me a joke")).await;

    h.swipe();
    h.until_dialogue_ends().await;

    assert_eq!(
        h.backend.requests(),
        [("test-key".to_owned(), "tell me a joke".to_owned())]
    );
    assert_eq!(h.speaker.spoken()[1], "Forty two.");
    h.shutdown().await;
}

#[tokio::test]
async fn brief_query_carries_summary_instruction() {
    let mut h = Harness::start(Setup::saying("What is the capital of France?")).await;

    h.swipe();
    h.until_dialogue_ends().await;

    let requests = h.backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].1,
        "Please provide a brief summary: what is the capital of france?"
    );
    h.shutdown().await;
}

#[tokio::test]
async fn query_text_reaches_backend_with_decimals() {
    let mut h = Harness::start(Setup::saying("What is 2.5 plus 1.5?")).await;

    h.swipe();
    h.until_dialogue_ends().await;

    assert_eq!(
        h.backend.requests()[0].1,
        "Please provide a brief summary: what is 2.5 plus 1.5?"
    );
    h.shutdown().await;
}

#[tokio::test]
async fn question_ending_in_open_is_not_a_launch() {
    let mut h = Harness::start(Setup::saying("When does the store open?")).await;

    h.swipe();
    h.until_dialogue_ends().await;

    assert!(h.actions.calls().is_empty());
    assert_eq!(h.backend.requests().len(), 1);
    assert_eq!(h.speaker.spoken()[1], "Forty two.");
    h.shutdown().await;
}

#[tokio::test]
async fn remote_failure_speaks_fallback() {
    let mut h = Harness::start(Setup {
        answer: Err(RemoteError::Request("connection reset".to_owned())),
        ..Setup::saying("tell me a joke")
    })
    .await;

    h.swipe();
    h.until_dialogue_ends().await;
    assert_eq!(h.speaker.spoken()[1], FALLBACK);
    h.shutdown().await;
}

#[tokio::test]
async fn missing_api_key_skips_backend() {
    let mut h = Harness::start(Setup {
        api_key: None,
        ..Setup::saying("tell me a joke")
    })
    .await;

    h.swipe();
    h.until_dialogue_ends().await;
    assert!(h.backend.requests().is_empty());
    assert_eq!(h.speaker.spoken()[1], FALLBACK);
    h.shutdown().await;
}

#[tokio::test]
async fn consecutive_dialogues_each_pair_listening() {
    let mut h = Harness::start(Setup {
        transcripts: vec![
            Ok("clear all notifications".to_owned()),
            Ok("set ringer to silent".to_owned()),
        ],
        ..Setup::default()
    })
    .await;

    let mut changes = Vec::new();
    for _ in 0..2 {
        h.swipe();
        changes.extend(listening_changes(&h.until_dialogue_ends().await));
    }

    assert_eq!(changes, [true, false, true, false]);
    assert_eq!(
        h.actions.calls(),
        ["clear_notifications", "set_ringer_mode:silent"]
    );
    assert_eq!(
        h.speaker.spoken()[3],
        "Ringer mode successfully set to silent mode"
    );
    assert_eq!(h.handle.snapshot().await.unwrap().generation, 2);
    h.shutdown().await;
}

#[tokio::test]
async fn shutdown_mid_dialogue_closes_listening() {
    let mut h = Harness::start(Setup {
        gated_speaker: true,
        ..Setup::saying("clear all notifications")
    })
    .await;

    h.swipe();
    h.wait_for(|s| s.phase == Phase::SpeakingPrompt).await;
    let mut events = h.drain();
    events.extend(h.shutdown().await);

    assert_eq!(listening_changes(&events), [true, false]);
}
