//! Telegram voice-note ingestion.
//!
//! One webhook update flows through: debug log, command handling, file
//! resolution and download, object-store write, transcription, event insert,
//! optional extraction, and a reply to the sender. Transcription and
//! extraction failures (including saving extracted fields) degrade the
//! result; any other failure after the acknowledgement is reported back to the
//! sender as an error reply. Nothing is retried.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value as JsonValue;
use tracing::{error, info, warn};

use diary_core::defaults::{
    DEFAULT_AUDIO_CONTENT_TYPE, MIN_EXTRACTION_CHARS, TELEGRAM_REPLY_MAX_CHARS,
    TRANSCRIPTION_FAILED_PLACEHOLDER,
};
use diary_core::{
    audio_url, telegram_voice_key, DebugLogRepository, EventRepository, NewEvent, Result,
};
use diary_db::StorageBackend;
use diary_inference::{EventExtractor, TranscriptionBackend};

use super::telegram::{sender_label, TelegramApi, TelegramAttachment, TelegramMessage};

pub const GREETING_TEXT: &str =
    "🎙️ Hi! Send me a Voice Message and I'll transcribe it + extract key events.";
pub const SEND_VOICE_TEXT: &str = "Please send a Voice message.";
pub const PROCESSING_TEXT: &str = "🎧 Processing your audio...";

/// What the pipeline did with one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    /// No usable message in the update.
    Ignored,
    /// `/start` answered with the greeting.
    Greeted,
    /// Message without voice or audio; the sender was asked for one.
    NoAttachment,
    /// Event stored; `extracted` tells whether structured fields were saved.
    Processed { event_id: i64, extracted: bool },
    /// Processing failed after the acknowledgement; an error reply was sent.
    Failed(String),
}

/// Runs the ingestion steps for Telegram updates.
pub struct IngestionPipeline {
    telegram: Arc<dyn TelegramApi>,
    storage: Arc<dyn StorageBackend>,
    events: Arc<dyn EventRepository>,
    debug_logs: Arc<dyn DebugLogRepository>,
    transcription: Option<Arc<dyn TranscriptionBackend>>,
    extractor: Option<EventExtractor>,
}

impl IngestionPipeline {
    pub fn new(
        telegram: Arc<dyn TelegramApi>,
        storage: Arc<dyn StorageBackend>,
        events: Arc<dyn EventRepository>,
        debug_logs: Arc<dyn DebugLogRepository>,
    ) -> Self {
        Self {
            telegram,
            storage,
            events,
            debug_logs,
            transcription: None,
            extractor: None,
        }
    }

    pub fn with_transcription(mut self, backend: Option<Arc<dyn TranscriptionBackend>>) -> Self {
        self.transcription = backend;
        self
    }

    pub fn with_extractor(mut self, extractor: Option<EventExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Handle one decoded webhook update.
    pub async fn handle_update(&self, update: &JsonValue) -> IngestionOutcome {
        self.record_debug_payload(update).await;

        let raw_message = match update.get("message") {
            Some(m) if !m.is_null() => m,
            _ => return IngestionOutcome::Ignored,
        };
        let message: TelegramMessage = match serde_json::from_value(raw_message.clone()) {
            Ok(m) => m,
            Err(e) => {
                warn!(
                    subsystem = "telegram",
                    component = "ingestion",
                    op = "parse_message",
                    error = %e,
                    "Ignoring message without a usable chat"
                );
                return IngestionOutcome::Ignored;
            }
        };
        let chat_id = message.chat.id;

        if message.is_start_command() {
            self.reply(chat_id, GREETING_TEXT, None).await;
            return IngestionOutcome::Greeted;
        }

        let Some(attachment) = message.attachment() else {
            self.reply(chat_id, SEND_VOICE_TEXT, None).await;
            return IngestionOutcome::NoAttachment;
        };

        self.reply(chat_id, PROCESSING_TEXT, None).await;

        let start = Instant::now();
        match self.process_voice(attachment, raw_message).await {
            Ok((event_id, transcription, extracted)) => {
                info!(
                    subsystem = "telegram",
                    component = "ingestion",
                    op = "process_voice",
                    event_id,
                    extracted,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Voice note ingested"
                );
                self.reply(chat_id, &format_transcription_reply(&transcription), Some("HTML"))
                    .await;
                IngestionOutcome::Processed {
                    event_id,
                    extracted,
                }
            }
            Err(e) => {
                error!(
                    subsystem = "telegram",
                    component = "ingestion",
                    op = "process_voice",
                    file_id = %attachment.file_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Voice note ingestion failed"
                );
                let reply = format!("❌ Error processing audio: {}", e);
                self.reply(chat_id, &reply, None).await;
                IngestionOutcome::Failed(e.to_string())
            }
        }
    }

    async fn record_debug_payload(&self, update: &JsonValue) {
        let sender = sender_label(update);
        if let Err(e) = self.debug_logs.record(&update.to_string(), &sender).await {
            warn!(
                subsystem = "telegram",
                component = "ingestion",
                op = "debug_log",
                error = %e,
                "Failed to record webhook payload"
            );
        }
    }

    /// Download, store, transcribe, persist and extract. Returns
    /// `(event_id, transcription, extracted)`.
    async fn process_voice(
        &self,
        attachment: &TelegramAttachment,
        raw_message: &JsonValue,
    ) -> Result<(i64, String, bool)> {
        let file_path = self.telegram.get_file_path(&attachment.file_id).await?;
        let audio = self.telegram.download_file(&file_path).await?;

        let key = telegram_voice_key(&attachment.file_id);
        self.storage.write(&key, &audio).await?;
        let audio_ref = audio_url(&key);

        let mime_type = attachment
            .mime_type
            .as_deref()
            .unwrap_or(DEFAULT_AUDIO_CONTENT_TYPE);
        let transcription = self.transcribe(&audio, mime_type).await;

        let event_id = self
            .events
            .insert(&NewEvent {
                telegram_file_id: attachment.file_id.clone(),
                audio_url: audio_ref,
                transcription: transcription.clone(),
                raw_metadata: raw_message.clone(),
            })
            .await?;

        let mut extracted = false;
        if transcription.chars().count() > MIN_EXTRACTION_CHARS {
            if let Some(extractor) = &self.extractor {
                match extractor.extract(&transcription).await {
                    Ok(extraction) => {
                        match self.events.store_extraction(event_id, &extraction).await {
                            Ok(()) => extracted = true,
                            Err(e) => {
                                warn!(
                                    subsystem = "telegram",
                                    component = "ingestion",
                                    op = "store_extraction",
                                    event_id,
                                    error = %e,
                                    "Extraction not saved; event left unprocessed"
                                );
                            }
                        }
                    }
                    Err(e) => {
                        warn!(
                            subsystem = "telegram",
                            component = "ingestion",
                            op = "extract",
                            event_id,
                            error = %e,
                            "Extraction skipped; event left unprocessed"
                        );
                    }
                }
            }
        }

        Ok((event_id, transcription, extracted))
    }

    /// Transcript text, or the failure placeholder.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> String {
        let Some(backend) = &self.transcription else {
            warn!(
                subsystem = "telegram",
                component = "ingestion",
                op = "transcribe",
                "No transcription backend configured"
            );
            return TRANSCRIPTION_FAILED_PLACEHOLDER.to_string();
        };
        match backend.transcribe(audio, mime_type).await {
            Ok(result) => result.text,
            Err(e) => {
                warn!(
                    subsystem = "telegram",
                    component = "ingestion",
                    op = "transcribe",
                    model = %backend.model_name(),
                    error = %e,
                    "Transcription failed"
                );
                TRANSCRIPTION_FAILED_PLACEHOLDER.to_string()
            }
        }
    }

    /// Send a reply; failures are logged and dropped.
    async fn reply(&self, chat_id: i64, text: &str, parse_mode: Option<&str>) {
        if let Err(e) = self.telegram.send_message(chat_id, text, parse_mode).await {
            warn!(
                subsystem = "telegram",
                component = "ingestion",
                op = "reply",
                chat_id,
                error = %e,
                "Failed to send Telegram reply"
            );
        }
    }
}

/// HTML reply for a transcription, truncated to the Telegram-safe length.
pub fn format_transcription_reply(transcription: &str) -> String {
    let body = if transcription.chars().count() > TELEGRAM_REPLY_MAX_CHARS {
        let cut: String = transcription.chars().take(TELEGRAM_REPLY_MAX_CHARS).collect();
        format!("{}...", cut)
    } else {
        transcription.to_string()
    };
    format!("📝 <b>Transcription:</b>\n\n{}", escape_html(&body))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
