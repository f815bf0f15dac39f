//! Ingested event views and the stored-audio proxy.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::Deserialize;

use diary_core::defaults::{DEBUG_LOG_LIMIT, DEFAULT_AUDIO_CONTENT_TYPE};
use diary_core::{detect_content_type, validate_object_key};
use diary_db::{
    DebugLogRepository, Error, Event, EventDataEntry, EventRepository, TelegramDebugLog,
};

use super::{blob_response, parse_i64};
use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct EventDataQuery {
    pub event_id: Option<String>,
}

pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<Event>>, ApiError> {
    Ok(Json(state.db.events.list().await?))
}

/// Extracted key/value rows, optionally for one event.
pub async fn list_event_data(
    State(state): State<AppState>,
    Query(query): Query<EventDataQuery>,
) -> Result<Json<Vec<EventDataEntry>>, ApiError> {
    let event_id = parse_i64(query.event_id.as_deref(), "event_id")?;
    Ok(Json(state.db.events.list_data(event_id).await?))
}

pub async fn telegram_debug(
    State(state): State<AppState>,
) -> Result<Json<Vec<TelegramDebugLog>>, ApiError> {
    Ok(Json(state.db.debug_logs.recent(DEBUG_LOG_LIMIT).await?))
}

pub async fn serve_audio(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    validate_object_key(&key)?;
    let data = match state.storage.read(&key).await {
        Ok(data) => data,
        Err(Error::NotFound(_)) => return Err(ApiError::NotFound("Audio not found".to_string())),
        Err(e) => return Err(e.into()),
    };
    let content_type = detect_content_type(&data, DEFAULT_AUDIO_CONTENT_TYPE);
    Ok(blob_response(data, content_type, false))
}
