//! Mock backends for deterministic testing.
//!
//! ```rust
//! use diary_inference::mock::{MockGenerationBackend, MockTranscriptionBackend};
//!
//! let generation = MockGenerationBackend::new(r#"{"summary":"ok"}"#).with_json_mode(true);
//! let transcription = MockTranscriptionBackend::new("bought milk and eggs");
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use diary_core::{Error, GenerationBackend, Result};

use crate::transcription::{TranscriptionBackend, TranscriptionResult};

/// Generation backend returning a fixed response and recording each call.
#[derive(Clone)]
pub struct MockGenerationBackend {
    response: String,
    fail: bool,
    json_mode: bool,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockGenerationBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            fail: false,
            json_mode: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A backend whose every call fails with an inference error.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Recorded `(system, prompt)` pairs.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((system.to_string(), prompt.to_string()));
        }
        if self.fail {
            return Err(Error::Inference("mock generation failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn json_mode(&self) -> bool {
        self.json_mode
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}

/// Transcription backend returning a fixed transcript.
#[derive(Clone)]
pub struct MockTranscriptionBackend {
    text: String,
    fail: bool,
    calls: Arc<Mutex<Vec<(usize, String)>>>,
}

impl MockTranscriptionBackend {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    /// Recorded `(byte_len, mime_type)` pairs.
    pub fn calls(&self) -> Vec<(usize, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TranscriptionBackend for MockTranscriptionBackend {
    async fn transcribe(&self, audio_data: &[u8], mime_type: &str) -> Result<TranscriptionResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((audio_data.len(), mime_type.to_string()));
        }
        if self.fail {
            return Err(Error::Transcription("mock transcription failure".to_string()));
        }
        Ok(TranscriptionResult {
            text: self.text.clone(),
            language: Some("en".to_string()),
            duration_secs: None,
        })
    }

    fn model_name(&self) -> &str {
        "mock-whisper"
    }
}
