//! Transcription backend trait and the Whisper-compatible HTTP adapter.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use diary_core::defaults::{
    DEFAULT_WHISPER_MODEL, ENV_WHISPER_BASE_URL, ENV_WHISPER_MODEL, WHISPER_TIMEOUT_SECS,
};
use diary_core::{Error, Result};

/// Result of audio transcription.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionResult {
    /// Full transcribed text.
    pub text: String,
    /// Detected language (ISO 639-1 code).
    pub language: Option<String>,
    /// Total audio duration in seconds.
    pub duration_secs: Option<f64>,
}

/// Backend for transcribing audio.
#[async_trait]
pub trait TranscriptionBackend: Send + Sync {
    /// Transcribe audio bytes of the given MIME type.
    async fn transcribe(&self, audio_data: &[u8], mime_type: &str) -> Result<TranscriptionResult>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible Whisper backend (`POST {base}/v1/audio/transcriptions`).
pub struct WhisperBackend {
    base_url: String,
    model: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

impl WhisperBackend {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
            timeout_secs: WHISPER_TIMEOUT_SECS,
        }
    }

    /// Create from environment variables.
    /// Returns None if WHISPER_BASE_URL is not set.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var(ENV_WHISPER_BASE_URL).ok()?;
        if base_url.is_empty() {
            return None;
        }
        let model = std::env::var(ENV_WHISPER_MODEL)
            .unwrap_or_else(|_| DEFAULT_WHISPER_MODEL.to_string());
        Some(Self::new(base_url, model))
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// File extension Whisper servers use to pick a decoder.
fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" | "audio/opus" => "ogg",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/aac" => "aac",
        "audio/webm" | "video/webm" => "webm",
        "audio/mp4" | "audio/m4a" | "audio/x-m4a" => "m4a",
        _ => "ogg",
    }
}

/// OpenAI Whisper API response format.
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

#[async_trait]
impl TranscriptionBackend for WhisperBackend {
    async fn transcribe(&self, audio_data: &[u8], mime_type: &str) -> Result<TranscriptionResult> {
        let url = format!(
            "{}/v1/audio/transcriptions",
            self.base_url.trim_end_matches('/')
        );

        let file_part = reqwest::multipart::Part::bytes(audio_data.to_vec())
            .file_name(format!("audio.{}", extension_for(mime_type)))
            .mime_str(mime_type)
            .map_err(|e| Error::Transcription(format!("Failed to create multipart: {}", e)))?;

        let form = reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json");

        debug!(
            subsystem = "inference",
            component = "whisper",
            op = "transcribe",
            bytes = audio_data.len(),
            mime_type,
            "Sending audio for transcription"
        );

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| Error::Transcription(format!("Transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transcription(format!(
                "Whisper API returned {}: {}",
                status, body
            )));
        }

        let result: WhisperResponse = response.json().await.map_err(|e| {
            Error::Transcription(format!("Failed to parse whisper response: {}", e))
        })?;

        Ok(TranscriptionResult {
            text: result.text.trim().to_string(),
            language: result.language,
            duration_secs: result.duration,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whisper_backend_new() {
        let backend =
            WhisperBackend::new("http://localhost:8000".to_string(), "whisper-1".to_string());
        assert_eq!(backend.base_url, "http://localhost:8000");
        assert_eq!(backend.timeout_secs, WHISPER_TIMEOUT_SECS);
        assert_eq!(backend.model_name(), "whisper-1");
    }

    #[test]
    fn test_with_timeout_overrides_default() {
        let backend = WhisperBackend::new("http://x".to_string(), "m".to_string()).with_timeout(7);
        assert_eq!(backend.timeout_secs, 7);
    }

    #[test]
    fn test_whisper_response_deserialization_minimal() {
        let response: WhisperResponse = serde_json::from_str(r#"{"text": "Hello"}"#).unwrap();
        assert_eq!(response.text, "Hello");
        assert!(response.language.is_none());
        assert!(response.duration.is_none());
    }

    #[test]
    fn test_extension_for_mime_types() {
        assert_eq!(extension_for("audio/ogg"), "ogg");
        assert_eq!(extension_for("audio/mpeg"), "mp3");
        assert_eq!(extension_for("audio/webm"), "webm");
        assert_eq!(extension_for("application/octet-stream"), "ogg");
    }
}
