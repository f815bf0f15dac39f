//! Note handlers.

use std::str::FromStr;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use diary_db::{Importance, Note, NoteFilter, NoteFull, NoteInput, NoteRepository};

use super::{non_blank, parse_date, parse_i64, success};
use crate::services::notes::delete_note_with_photos;
use crate::{ApiError, AppState};

/// Raw `/api/notes` query string; blank values are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct NoteListQuery {
    pub category: Option<String>,
    pub person_id: Option<String>,
    pub tag_id: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub importance: Option<String>,
}

impl NoteListQuery {
    fn into_filter(self) -> Result<NoteFilter, ApiError> {
        let importance = match non_blank(self.importance) {
            Some(raw) => Some(
                Importance::from_str(&raw)
                    .map_err(|_| ApiError::BadRequest(format!("Invalid importance: {}", raw)))?,
            ),
            None => None,
        };
        Ok(NoteFilter {
            category: non_blank(self.category),
            person_id: parse_i64(self.person_id.as_deref(), "person_id")?,
            tag_id: parse_i64(self.tag_id.as_deref(), "tag_id")?,
            search: non_blank(self.search),
            start_date: parse_date(self.start_date.as_deref(), "start_date")?,
            end_date: parse_date(self.end_date.as_deref(), "end_date")?,
            importance,
        })
    }
}

fn validate(input: &NoteInput) -> Result<(), ApiError> {
    if input.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content is required".to_string()));
    }
    Ok(())
}

/// List notes, newest event first, with people, tags and photos.
pub async fn list_notes(
    State(state): State<AppState>,
    Query(query): Query<NoteListQuery>,
) -> Result<Json<Vec<NoteFull>>, ApiError> {
    let filter = query.into_filter()?;
    Ok(Json(state.db.notes.list(&filter).await?))
}

pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NoteFull>, ApiError> {
    state
        .db
        .notes
        .fetch(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))
}

pub async fn create_note(
    State(state): State<AppState>,
    Json(input): Json<NoteInput>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    validate(&input)?;
    let note = state.db.notes.create(&input).await?;
    info!(
        subsystem = "api",
        component = "notes",
        op = "create",
        note_id = note.id,
        people = input.people.len(),
        tags = input.tags.len(),
        "Note created"
    );
    Ok((StatusCode::CREATED, Json(note)))
}

/// Update a note and replace its people and tags.
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<NoteInput>,
) -> Result<Json<Note>, ApiError> {
    validate(&input)?;
    state
        .db
        .notes
        .update(id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Note not found".to_string()))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let removed = delete_note_with_photos(
        &state.db.notes,
        &state.db.photos,
        state.storage.as_ref(),
        id,
    )
    .await?;
    info!(
        subsystem = "api",
        component = "notes",
        op = "delete",
        note_id = id,
        blobs_removed = removed,
        "Note deleted"
    );
    Ok(success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_query_values_are_ignored() {
        let filter = NoteListQuery {
            category: Some("".into()),
            person_id: Some(" ".into()),
            search: Some("dentist".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert!(filter.category.is_none());
        assert!(filter.person_id.is_none());
        assert_eq!(filter.search.as_deref(), Some("dentist"));
    }

    #[test]
    fn test_importance_is_case_insensitive() {
        let filter = NoteListQuery {
            importance: Some("high".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.importance, Some(Importance::High));
    }

    #[test]
    fn test_bad_tag_id_is_rejected() {
        let err = NoteListQuery {
            tag_id: Some("abc".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
