//! In-memory collaborators for the ingestion pipeline and router tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use diary_api::TelegramApi;
use diary_core::{
    DebugLogRepository, Error, Event, EventDataEntry, EventExtraction, EventRepository, NewEvent,
    Result, TelegramDebugLog,
};

/// Records outgoing messages; `getFile` fails for file ids starting with `bad`.
#[derive(Default)]
pub struct FakeTelegram {
    pub sent: Mutex<Vec<(i64, String, Option<String>)>>,
}

impl FakeTelegram {
    pub fn sent(&self) -> Vec<(i64, String, Option<String>)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelegramApi for FakeTelegram {
    async fn get_file_path(&self, file_id: &str) -> Result<String> {
        if file_id.starts_with("bad") {
            return Err(Error::Telegram("Failed to get file path".to_string()));
        }
        Ok(format!("voice/{}.oga", file_id))
    }

    async fn download_file(&self, _file_path: &str) -> Result<Vec<u8>> {
        Ok(b"OggS fake voice bytes".to_vec())
    }

    async fn send_message(&self, chat_id: i64, text: &str, parse_mode: Option<&str>) -> Result<()> {
        self.sent.lock().unwrap().push((
            chat_id,
            text.to_string(),
            parse_mode.map(str::to_string),
        ));
        Ok(())
    }
}

/// In-memory events; `store_extraction` fails when `fail_extraction` is set.
#[derive(Default)]
pub struct FakeEvents {
    pub inserted: Mutex<Vec<NewEvent>>,
    pub extractions: Mutex<Vec<(i64, EventExtraction)>>,
    pub fail_extraction: bool,
}

#[async_trait]
impl EventRepository for FakeEvents {
    async fn insert(&self, event: &NewEvent) -> Result<i64> {
        let mut inserted = self.inserted.lock().unwrap();
        inserted.push(event.clone());
        Ok(inserted.len() as i64)
    }

    async fn store_extraction(&self, event_id: i64, extraction: &EventExtraction) -> Result<()> {
        if self.fail_extraction {
            return Err(Error::Internal("event_data insert failed".to_string()));
        }
        self.extractions
            .lock()
            .unwrap()
            .push((event_id, extraction.clone()));
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Event>> {
        Ok(Vec::new())
    }

    async fn list_data(&self, _event_id: Option<i64>) -> Result<Vec<EventDataEntry>> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct FakeDebugLogs {
    pub payloads: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl DebugLogRepository for FakeDebugLogs {
    async fn record(&self, payload: &str, sender: &str) -> Result<()> {
        self.payloads
            .lock()
            .unwrap()
            .push((payload.to_string(), sender.to_string()));
        Ok(())
    }

    async fn recent(&self, _limit: i64) -> Result<Vec<TelegramDebugLog>> {
        Ok(Vec::new())
    }
}

pub struct Fakes {
    pub telegram: Arc<FakeTelegram>,
    pub events: Arc<FakeEvents>,
    pub debug_logs: Arc<FakeDebugLogs>,
}

impl Fakes {
    pub fn new() -> Self {
        Self {
            telegram: Arc::new(FakeTelegram::default()),
            events: Arc::new(FakeEvents::default()),
            debug_logs: Arc::new(FakeDebugLogs::default()),
        }
    }
}

pub fn text_update(chat_id: i64, text: &str) -> Value {
    json!({
        "update_id": 1,
        "message": {
            "message_id": 10,
            "from": { "id": 99, "first_name": "Sam", "username": "sam" },
            "chat": { "id": chat_id, "type": "private" },
            "text": text
        }
    })
}

pub fn voice_update(chat_id: i64, file_id: &str) -> Value {
    json!({
        "update_id": 2,
        "message": {
            "message_id": 11,
            "from": { "id": 99, "first_name": "Sam" },
            "chat": { "id": chat_id, "type": "private" },
            "voice": { "file_id": file_id, "duration": 4, "mime_type": "audio/ogg" }
        }
    })
}
