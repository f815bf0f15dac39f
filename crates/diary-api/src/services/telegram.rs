//! Telegram Bot API client and update payload types.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use diary_core::defaults::TELEGRAM_TIMEOUT_SECS;
use diary_core::{Error, Result};

/// The subset of the Bot API the ingestion pipeline uses.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Resolve a `file_id` to its download path via `getFile`.
    async fn get_file_path(&self, file_id: &str) -> Result<String>;

    /// Download a file previously resolved with [`get_file_path`](Self::get_file_path).
    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>>;

    async fn send_message(&self, chat_id: i64, text: &str, parse_mode: Option<&str>)
        -> Result<()>;
}

/// HTTP client for `https://api.telegram.org` (or a compatible base URL).
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(TELEGRAM_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Telegram(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }
}

#[derive(Deserialize)]
struct GetFileResponse {
    #[serde(default)]
    ok: bool,
    result: Option<TelegramFile>,
}

#[derive(Deserialize)]
struct TelegramFile {
    file_path: Option<String>,
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

#[async_trait]
impl TelegramApi for TelegramClient {
    async fn get_file_path(&self, file_id: &str) -> Result<String> {
        let response: GetFileResponse = self
            .client
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await
            .map_err(|e| Error::Telegram(format!("getFile request failed: {}", e)))?
            .json()
            .await
            .map_err(|e| Error::Telegram(format!("Invalid getFile response: {}", e)))?;

        if !response.ok {
            return Err(Error::Telegram("Failed to get file path".to_string()));
        }
        response
            .result
            .and_then(|f| f.file_path)
            .ok_or_else(|| Error::Telegram("Failed to get file path".to_string()))
    }

    async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        let url = format!("{}/file/bot{}/{}", self.base_url, self.token, file_path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Telegram(format!("File download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Telegram(format!(
                "File download returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Telegram(format!("File download failed: {}", e)))?;
        debug!(
            subsystem = "telegram",
            component = "client",
            op = "download_file",
            bytes = bytes.len(),
            "Downloaded file"
        );
        Ok(bytes.to_vec())
    }

    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest {
                chat_id,
                text,
                parse_mode,
            })
            .send()
            .await
            .map_err(|e| Error::Telegram(format!("sendMessage request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Telegram(format!(
                "sendMessage returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}

// =============================================================================
// UPDATE PAYLOAD
// =============================================================================

/// Fields of an incoming `message` the pipeline reads.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub voice: Option<TelegramAttachment>,
    #[serde(default)]
    pub audio: Option<TelegramAttachment>,
}

impl TelegramMessage {
    /// Voice note, else audio file.
    pub fn attachment(&self) -> Option<&TelegramAttachment> {
        self.voice.as_ref().or(self.audio.as_ref())
    }

    pub fn is_start_command(&self) -> bool {
        self.text.as_deref().is_some_and(|t| t.starts_with("/start"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramAttachment {
    pub file_id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Sender label for the debug log: username, else numeric id, else `unknown`.
pub fn sender_label(update: &JsonValue) -> String {
    let from = &update["message"]["from"];
    if let Some(username) = from["username"].as_str().filter(|u| !u.is_empty()) {
        return username.to_string();
    }
    match &from["id"] {
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) if !s.is_empty() => s.clone(),
        _ => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sender_label_precedence() {
        assert_eq!(
            sender_label(&json!({"message": {"from": {"id": 42, "username": "ana"}}})),
            "ana"
        );
        assert_eq!(sender_label(&json!({"message": {"from": {"id": 42}}})), "42");
        assert_eq!(sender_label(&json!({"update_id": 1})), "unknown");
    }

    #[test]
    fn test_attachment_prefers_voice() {
        let message: TelegramMessage = serde_json::from_value(json!({
            "chat": {"id": 7},
            "voice": {"file_id": "v1", "mime_type": "audio/ogg"},
            "audio": {"file_id": "a1"}
        }))
        .unwrap();
        assert_eq!(message.attachment().unwrap().file_id, "v1");
        assert!(!message.is_start_command());
    }

    #[test]
    fn test_start_command_prefix() {
        let message: TelegramMessage =
            serde_json::from_value(json!({"chat": {"id": 7}, "text": "/start@diary_bot"}))
                .unwrap();
        assert!(message.is_start_command());
        assert!(message.attachment().is_none());
    }
}
