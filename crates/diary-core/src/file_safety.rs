//! Object-store key construction and validation.
//!
//! Keys are plain relative paths such as `photos/12_1700000000000_cat.jpg`.
//! Everything that reaches the object store or the proxy routes goes through
//! [`validate_object_key`] first.

use chrono::NaiveDate;

use crate::defaults;
use crate::error::{Error, Result};

/// Key for an uploaded note photo: `photos/{note_id}_{ts_millis}_{file_name}`.
pub fn photo_key(note_id: i64, ts_millis: i64, file_name: &str) -> String {
    format!(
        "photos/{}_{}_{}",
        note_id,
        ts_millis,
        sanitize_filename(file_name)
    )
}

/// Key for a habit voice note: `habit-notes/{habit_id}_{date}_{ts_millis}.ogg`.
pub fn habit_voice_key(habit_id: i64, date: NaiveDate, ts_millis: i64) -> String {
    format!("habit-notes/{}_{}_{}.ogg", habit_id, date, ts_millis)
}

/// Key for a Telegram voice download: `{file_id}.ogg`.
pub fn telegram_voice_key(file_id: &str) -> String {
    format!("{}.ogg", sanitize_filename(file_id))
}

/// Proxy URL served for a photo key.
pub fn photo_url(key: &str) -> String {
    format!("{}{}", defaults::PHOTO_URL_PREFIX, key)
}

/// Proxy URL served for an audio key.
pub fn audio_url(key: &str) -> String {
    format!("{}{}", defaults::AUDIO_URL_PREFIX, key)
}

/// Reject keys that could escape the store root.
pub fn validate_object_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidInput("Object key is empty".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') || key.contains('\0') {
        return Err(Error::InvalidInput(format!("Invalid object key: {}", key)));
    }
    if key.split('/').any(|segment| segment == ".." || segment == ".") {
        return Err(Error::InvalidInput(format!("Invalid object key: {}", key)));
    }
    Ok(())
}

/// Sanitize a client-supplied filename for use inside an object key.
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\0' | ' ' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let sanitized = sanitized.trim_matches('.');
    if sanitized.is_empty() {
        return "unnamed_file".to_string();
    }

    // 255 bytes max, extension preserved
    if sanitized.len() > 255 {
        let mut cut = 255;
        let ext = sanitized
            .rfind('.')
            .map(|pos| &sanitized[pos..])
            .filter(|ext| ext.len() < 32)
            .unwrap_or("");
        cut -= ext.len();
        while !sanitized.is_char_boundary(cut) {
            cut -= 1;
        }
        return format!("{}{}", &sanitized[..cut], ext);
    }

    sanitized.to_string()
}

/// Content type for stored bytes, sniffed from magic bytes.
pub fn detect_content_type(data: &[u8], fallback: &str) -> String {
    match infer::get(data) {
        Some(kind) => kind.mime_type().to_string(),
        None => fallback.to_string(),
    }
}
