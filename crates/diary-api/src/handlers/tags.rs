//! Tag handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use diary_db::{Tag, TagInput, TagRepository};

use super::success;
use crate::{ApiError, AppState};

fn validate(input: &TagInput) -> Result<(), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    Ok(())
}

pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.db.tags.list().await?))
}

/// Create a tag; a taken name is a 409.
pub async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<TagInput>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    validate(&input)?;
    let tag = state.db.tags.create(&input).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<TagInput>,
) -> Result<Json<Tag>, ApiError> {
    validate(&input)?;
    state
        .db
        .tags
        .update(id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.db.tags.delete(id).await?;
    Ok(success())
}
