//! Gemini backend contract tests.
//!
//! Verify the `generateContent` wire format, answer extraction, error
//! mapping and the adapter's fallback behaviour against a mock server.

use risa::config::RemoteConfig;
use risa::remote::{GeminiBackend, GeminiConfig, LanguageBackend, RemoteError, RemoteQueryAdapter};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str = "/v1beta/models/gemini-1.5-flash-latest:generateContent";

fn answer(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

fn backend(server: &MockServer) -> GeminiBackend {
    GeminiBackend::new(GeminiConfig::new("gemini-1.5-flash-latest").with_base_url(server.uri()))
}

#[tokio::test]
async fn request_matches_generate_content_contract() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(query_param("key", "test-key"))
        .and(body_json(json!({ "contents": [{ "parts": [{ "text": "hello" }] }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("Hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let text = backend(&server).generate("test-key", "hello").await.unwrap();
    assert_eq!(text, "Hi there");
}

#[tokio::test]
async fn adapter_sends_brief_prompt_and_sanitizes_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(body_json(json!({
            "contents": [{ "parts": [{
                "text": "Please provide a brief summary: what is the capital of france"
            }] }]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(answer("**Paris** is\n\nthe   capital.")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let adapter = RemoteQueryAdapter::new(Arc::new(backend(&server)), &RemoteConfig::default());
    let reply = adapter
        .query("what is the capital of france", true, "test-key")
        .await;
    assert_eq!(reply, "Paris is the capital.");
}

#[tokio::test]
async fn http_error_carries_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let err = backend(&server).generate("bad", "hello").await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::Http {
            status: 400,
            message: "API key not valid.".to_owned()
        }
    );
}

#[tokio::test]
async fn server_error_becomes_fallback_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let adapter = RemoteQueryAdapter::new(Arc::new(backend(&server)), &RemoteConfig::default());
    let reply = adapter.query("tell me a joke", false, "test-key").await;
    assert_eq!(reply, adapter.fallback_answer());
}

#[tokio::test]
async fn blocked_prompt_without_candidates_is_empty_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = backend(&server).generate("k", "hello").await.unwrap_err();
    assert_eq!(err, RemoteError::EmptyAnswer);
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = backend(&server).generate("k", "hello").await.unwrap_err();
    assert!(matches!(err, RemoteError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(answer("late"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let backend = GeminiBackend::new(
        GeminiConfig::new("gemini-1.5-flash-latest")
            .with_base_url(server.uri())
            .with_timeout(Duration::from_millis(50)),
    );
    let err = backend.generate("k", "hello").await.unwrap_err();
    assert!(matches!(err, RemoteError::Request(_)), "got {err:?}");
}

#[tokio::test]
async fn transport_errors_do_not_leak_the_key() {
    // Nothing listens on the discard port.
    let backend = GeminiBackend::new(
        GeminiConfig::new("gemini-1.5-flash-latest").with_base_url("http://127.0.0.1:9"),
    );
    let err = backend
        .generate("secret-key-123", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Request(_)), "got {err:?}");
    assert!(!err.to_string().contains("secret-key-123"));
}
