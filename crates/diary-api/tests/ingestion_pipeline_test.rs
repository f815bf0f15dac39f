//! Telegram ingestion pipeline tests.
//!
//! The pipeline runs against in-memory Telegram and event repositories, mock
//! inference backends, and a filesystem object store in a temp directory.

mod common;

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use common::{text_update, voice_update, FakeEvents, Fakes};
use diary_api::services::ingestion::{
    IngestionOutcome, GREETING_TEXT, PROCESSING_TEXT, SEND_VOICE_TEXT,
};
use diary_api::IngestionPipeline;
use diary_core::defaults::TRANSCRIPTION_FAILED_PLACEHOLDER;
use diary_db::{FilesystemBackend, StorageBackend};
use diary_inference::mock::{MockGenerationBackend, MockTranscriptionBackend};
use diary_inference::{EventExtractor, TranscriptionBackend};

const EXTRACTION_JSON: &str = r#"{"summary":"Bought milk","category":"Shopping","importance":"Low","entities":{"money":["$4"]}}"#;

struct Harness {
    fakes: Fakes,
    storage: Arc<FilesystemBackend>,
    _dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        Self {
            fakes: Fakes::new(),
            storage: Arc::new(FilesystemBackend::new(dir.path())),
            _dir: dir,
        }
    }

    fn with_failing_extraction_store() -> Self {
        let mut h = Self::new();
        h.fakes.events = Arc::new(FakeEvents {
            fail_extraction: true,
            ..Default::default()
        });
        h
    }

    fn pipeline(
        &self,
        transcription: Option<MockTranscriptionBackend>,
        generation: Option<MockGenerationBackend>,
    ) -> IngestionPipeline {
        IngestionPipeline::new(
            self.fakes.telegram.clone(),
            self.storage.clone(),
            self.fakes.events.clone(),
            self.fakes.debug_logs.clone(),
        )
        .with_transcription(transcription.map(|t| Arc::new(t) as Arc<dyn TranscriptionBackend>))
        .with_extractor(generation.map(|g| EventExtractor::new(Arc::new(g))))
    }
}

#[tokio::test]
async fn test_start_command_is_greeted() {
    let h = Harness::new();
    let pipeline = h.pipeline(None, None);

    let outcome = pipeline.handle_update(&text_update(5, "/start")).await;

    assert_eq!(outcome, IngestionOutcome::Greeted);
    let sent = h.fakes.telegram.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 5);
    assert_eq!(sent[0].1, GREETING_TEXT);
    assert_eq!(h.fakes.debug_logs.payloads.lock().unwrap()[0].1, "sam");
}

#[tokio::test]
async fn test_text_message_asks_for_voice() {
    let h = Harness::new();
    let pipeline = h.pipeline(None, None);

    let outcome = pipeline.handle_update(&text_update(5, "hello")).await;

    assert_eq!(outcome, IngestionOutcome::NoAttachment);
    assert_eq!(h.fakes.telegram.sent()[0].1, SEND_VOICE_TEXT);
    assert!(h.fakes.events.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_without_message_is_ignored_but_logged() {
    let h = Harness::new();
    let pipeline = h.pipeline(None, None);

    let outcome = pipeline
        .handle_update(&json!({"update_id": 3, "edited_message": {}}))
        .await;

    assert_eq!(outcome, IngestionOutcome::Ignored);
    assert!(h.fakes.telegram.sent().is_empty());
    let payloads = h.fakes.debug_logs.payloads.lock().unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].1, "unknown");
}

#[tokio::test]
async fn test_voice_note_is_stored_transcribed_and_extracted() {
    let h = Harness::new();
    let transcription = MockTranscriptionBackend::new("Bought milk for four dollars <cheap>");
    let generation = MockGenerationBackend::new(EXTRACTION_JSON).with_json_mode(true);
    let pipeline = h.pipeline(Some(transcription.clone()), Some(generation.clone()));

    let outcome = pipeline.handle_update(&voice_update(8, "AwACAgQ")).await;

    assert_eq!(
        outcome,
        IngestionOutcome::Processed {
            event_id: 1,
            extracted: true
        }
    );

    let stored = h.storage.read("AwACAgQ.ogg").await.unwrap();
    assert_eq!(stored, b"OggS fake voice bytes");
    assert_eq!(transcription.calls()[0].1, "audio/ogg");

    let inserted = h.fakes.events.inserted.lock().unwrap();
    assert_eq!(inserted[0].telegram_file_id, "AwACAgQ");
    assert_eq!(inserted[0].audio_url, "/api/audio/AwACAgQ.ogg");
    assert_eq!(inserted[0].raw_metadata["chat"]["id"], 8);

    let extractions = h.fakes.events.extractions.lock().unwrap();
    assert_eq!(extractions[0].0, 1);
    assert_eq!(extractions[0].1.category, "Shopping");
    assert_eq!(generation.calls()[0].1, "Bought milk for four dollars <cheap>");

    let sent = h.fakes.telegram.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, PROCESSING_TEXT);
    assert_eq!(sent[1].2.as_deref(), Some("HTML"));
    assert!(sent[1].1.contains("&lt;cheap&gt;"));
}

#[tokio::test]
async fn test_transcription_failure_stores_placeholder() {
    let h = Harness::new();
    let pipeline = h.pipeline(Some(MockTranscriptionBackend::failing()), None);

    let outcome = pipeline.handle_update(&voice_update(8, "AwACAgQ")).await;

    assert!(matches!(
        outcome,
        IngestionOutcome::Processed {
            extracted: false,
            ..
        }
    ));
    let inserted = h.fakes.events.inserted.lock().unwrap();
    assert_eq!(inserted[0].transcription, TRANSCRIPTION_FAILED_PLACEHOLDER);
    assert!(h.fakes.telegram.sent()[1]
        .1
        .contains(TRANSCRIPTION_FAILED_PLACEHOLDER));
}

#[tokio::test]
async fn test_unparseable_extraction_leaves_event_unprocessed() {
    let h = Harness::new();
    let pipeline = h.pipeline(
        Some(MockTranscriptionBackend::new("Dentist appointment on Friday")),
        Some(MockGenerationBackend::new("I could not find any events.")),
    );

    let outcome = pipeline.handle_update(&voice_update(8, "AwACAgQ")).await;

    assert_eq!(
        outcome,
        IngestionOutcome::Processed {
            event_id: 1,
            extracted: false
        }
    );
    assert!(h.fakes.events.extractions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_extraction_store_failure_still_replies_with_transcript() {
    let h = Harness::with_failing_extraction_store();
    let pipeline = h.pipeline(
        Some(MockTranscriptionBackend::new("Bought milk for four dollars")),
        Some(MockGenerationBackend::new(EXTRACTION_JSON).with_json_mode(true)),
    );

    let outcome = pipeline.handle_update(&voice_update(8, "AwACAgQ")).await;

    assert_eq!(
        outcome,
        IngestionOutcome::Processed {
            event_id: 1,
            extracted: false
        }
    );
    assert_eq!(h.fakes.events.inserted.lock().unwrap().len(), 1);
    let sent = h.fakes.telegram.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].1.contains("Bought milk for four dollars"));
    assert!(!sent[1].1.starts_with("❌"));
}

#[tokio::test]
async fn test_short_transcript_skips_extraction() {
    let h = Harness::new();
    let generation = MockGenerationBackend::new(EXTRACTION_JSON);
    let pipeline = h.pipeline(
        Some(MockTranscriptionBackend::new("ok")),
        Some(generation.clone()),
    );

    pipeline.handle_update(&voice_update(8, "AwACAgQ")).await;

    assert!(generation.calls().is_empty());
}

#[tokio::test]
async fn test_get_file_failure_replies_with_error() {
    let h = Harness::new();
    let pipeline = h.pipeline(Some(MockTranscriptionBackend::new("unused")), None);

    let outcome = pipeline.handle_update(&voice_update(8, "bad-file")).await;

    assert!(matches!(outcome, IngestionOutcome::Failed(_)));
    assert!(h.fakes.events.inserted.lock().unwrap().is_empty());
    let sent = h.fakes.telegram.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].1.starts_with("❌ Error processing audio:"));
    assert!(sent[1].1.contains("Failed to get file path"));
}
