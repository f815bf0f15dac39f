//! HTTP contract tests for the Whisper and OpenAI adapters against a mock server.

use diary_inference::openai::{OpenAIBackend, OpenAIConfig};
use diary_inference::{
    Error, EventExtractor, GenerationBackend, TranscriptionBackend, WhisperBackend,
    EXTRACTION_SYSTEM_PROMPT,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn openai_backend(server: &MockServer, json_mode: bool) -> OpenAIBackend {
    OpenAIBackend::new(OpenAIConfig {
        base_url: server.uri(),
        api_key: Some("test-key".to_string()),
        gen_model: "test-gen".to_string(),
        timeout_seconds: 10,
        json_mode,
    })
    .expect("Failed to create backend")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

#[tokio::test]
async fn test_whisper_posts_multipart_and_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "  Picked up groceries.  ",
            "language": "en",
            "duration": 4.2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = WhisperBackend::new(server.uri(), "whisper-1".to_string());
    let result = backend.transcribe(b"OggS....", "audio/ogg").await.unwrap();

    assert_eq!(result.text, "Picked up groceries.");
    assert_eq!(result.language.as_deref(), Some("en"));
    assert_eq!(result.duration_secs, Some(4.2));
}

#[tokio::test]
async fn test_whisper_error_status_is_transcription_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&server)
        .await;

    let backend = WhisperBackend::new(server.uri(), "whisper-1".to_string());
    let err = backend.transcribe(b"x", "audio/ogg").await.unwrap_err();
    match err {
        Error::Transcription(msg) => assert!(msg.contains("model crashed")),
        other => panic!("expected transcription error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_generation_sends_auth_and_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "test-gen",
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hi")))
        .expect(1)
        .mount(&server)
        .await;

    let backend = openai_backend(&server, false);
    let text = backend.generate_with_system("be brief", "hello").await.unwrap();
    assert_eq!(text, "hi");
}

#[tokio::test]
async fn test_json_mode_requests_json_object_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "response_format": {"type": "json_object"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"summary":"Paid the electricity bill","category":"Finance","importance":"Medium","entities":{"money":["$80"]}}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = EventExtractor::new(Arc::new(openai_backend(&server, true)));
    let extraction = extractor.extract("paid eighty dollars for power").await.unwrap();

    assert_eq!(extraction.summary, "Paid the electricity bill");
    assert_eq!(extraction.category, "Finance");
    assert_eq!(extraction.importance, "Medium");
    assert_eq!(extraction.entities["money"][0], "$80");
}

#[tokio::test]
async fn test_extractor_uses_fixed_system_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{"role": "system", "content": EXTRACTION_SYSTEM_PROMPT}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "```json\n{\"summary\":\"Gym\",\"category\":\"Health\"}\n```",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = EventExtractor::new(Arc::new(openai_backend(&server, false)));
    let extraction = extractor.extract("went to the gym").await.unwrap();
    assert_eq!(extraction.category, "Health");
    assert_eq!(extraction.importance, "Low");
}

#[tokio::test]
async fn test_generation_auth_failure_maps_to_config_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let err = openai_backend(&server, false)
        .generate_with_system("", "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains("Incorrect API key")));
}
