//! HTTP handlers grouped by resource.

pub mod events;
pub mod habit_logs;
pub mod habits;
pub mod health;
pub mod notes;
pub mod people;
pub mod photos;
pub mod search;
pub mod session;
pub mod tags;
pub mod telegram;

use axum::extract::Multipart;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::ApiError;

/// `{ "success": true }`, returned by delete endpoints.
pub(crate) fn success() -> Json<serde_json::Value> {
    Json(json!({ "success": true }))
}

/// Parse an optional `YYYY-MM-DD` query value; blank counts as absent.
pub(crate) fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid {}: expected YYYY-MM-DD", field))),
    }
}

/// Parse an optional integer query value; blank counts as absent.
pub(crate) fn parse_i64(value: Option<&str>, field: &str) -> Result<Option<i64>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid {}", field))),
    }
}

/// Decode an optional JSON request body. An empty body yields the default;
/// a present body must parse.
pub(crate) fn optional_json_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
}

/// Trimmed non-empty text or `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A file part read from a multipart upload.
pub(crate) struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Read every part of a multipart body, keeping the file named `file_field`
/// and any text fields.
pub(crate) async fn read_multipart(
    mut multipart: Multipart,
    file_field: &str,
) -> Result<(Option<UploadedFile>, Vec<(String, String)>), ApiError> {
    let mut file = None;
    let mut fields = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().map(|n| n.to_string()).unwrap_or_default();
        if name == file_field {
            let file_name = field.file_name().map(|f| f.to_string());
            let content_type = field.content_type().map(|c| c.to_string());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
                .to_vec();
            file = Some(UploadedFile {
                file_name,
                content_type,
                data,
            });
        } else if !name.is_empty() {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?;
            fields.push((name, value));
        }
    }

    Ok((file, fields))
}

/// Binary response for a proxied blob.
pub(crate) fn blob_response(data: Vec<u8>, content_type: String, cache: bool) -> Response {
    if cache {
        (
            [
                (header::CONTENT_TYPE, content_type),
                (
                    header::CACHE_CONTROL,
                    "public, max-age=31536000".to_string(),
                ),
            ],
            data,
        )
            .into_response()
    } else {
        ([(header::CONTENT_TYPE, content_type)], data).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_blank_is_none() {
        assert_eq!(parse_date(Some("  "), "date").unwrap(), None);
        assert_eq!(parse_date(None, "date").unwrap(), None);
    }

    #[test]
    fn test_parse_date_valid_and_invalid() {
        assert_eq!(
            parse_date(Some("2026-03-01"), "date").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
        assert!(parse_date(Some("03/01/2026"), "date").is_err());
    }

    #[derive(Debug, Default, PartialEq, serde::Deserialize)]
    struct Flag {
        completed: Option<bool>,
    }

    #[test]
    fn test_optional_json_body() {
        assert_eq!(optional_json_body::<Flag>(b"").unwrap(), Flag::default());
        assert_eq!(optional_json_body::<Flag>(b" \n").unwrap(), Flag::default());
        assert_eq!(
            optional_json_body::<Flag>(br#"{"completed":true}"#).unwrap(),
            Flag {
                completed: Some(true)
            }
        );
        let err = optional_json_body::<Flag>(br#"{"completed":"yes"}"#).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_parse_i64() {
        assert_eq!(parse_i64(Some("42"), "person_id").unwrap(), Some(42));
        assert_eq!(parse_i64(Some(""), "person_id").unwrap(), None);
        assert!(parse_i64(Some("x"), "person_id").is_err());
    }
}
