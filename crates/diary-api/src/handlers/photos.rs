//! Photo upload, proxy and delete handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use diary_core::defaults::DEFAULT_PHOTO_CONTENT_TYPE;
use diary_core::{detect_content_type, photo_key, photo_url, validate_object_key};
use diary_db::{Error, NewPhoto, NoteRepository, Photo, PhotoRepository};

use super::{blob_response, read_multipart, success};
use crate::services::notes;
use crate::{ApiError, AppState};

/// Attach an uploaded image (multipart field `photo`) to a note.
pub async fn upload_photo(
    State(state): State<AppState>,
    Path(note_id): Path<i64>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Photo>), ApiError> {
    if !state.db.notes.exists(note_id).await? {
        return Err(ApiError::NotFound("Note not found".to_string()));
    }

    let (file, _) = read_multipart(multipart, "photo").await?;
    let file = file
        .filter(|f| !f.data.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No photo provided".to_string()))?;

    let file_name = file.file_name.unwrap_or_else(|| "photo".to_string());
    let key = photo_key(note_id, Utc::now().timestamp_millis(), &file_name);
    state.storage.write(&key, &file.data).await?;

    let mime_type = file
        .content_type
        .unwrap_or_else(|| detect_content_type(&file.data, DEFAULT_PHOTO_CONTENT_TYPE));

    let photo = state
        .db
        .photos
        .create(&NewPhoto {
            note_id,
            photo_url: photo_url(&key),
            file_name: Some(file_name),
            file_size: Some(file.data.len() as i64),
            mime_type: Some(mime_type),
        })
        .await?;

    info!(
        subsystem = "api",
        component = "photos",
        op = "upload",
        note_id,
        photo_id = photo.id,
        bytes = file.data.len(),
        "Photo stored"
    );
    Ok((StatusCode::CREATED, Json(photo)))
}

/// Public proxy for stored photos.
pub async fn serve_photo(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, ApiError> {
    validate_object_key(&key)?;
    let data = match state.storage.read(&key).await {
        Ok(data) => data,
        Err(Error::NotFound(_)) => return Err(ApiError::NotFound("Photo not found".to_string())),
        Err(e) => return Err(e.into()),
    };
    let content_type = detect_content_type(&data, DEFAULT_PHOTO_CONTENT_TYPE);
    Ok(blob_response(data, content_type, true))
}

pub async fn delete_photo(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let photo = state
        .db
        .photos
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Photo not found".to_string()))?;

    notes::delete_photo(&state.db.photos, state.storage.as_ref(), &photo).await?;
    Ok(success())
}
