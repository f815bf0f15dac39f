//! People CRUD handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;
use tracing::info;

use diary_db::{Person, PersonDetail, PersonInput, PersonRepository};

use super::success;
use crate::{ApiError, AppState};

fn validate(input: &PersonInput) -> Result<(), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    Ok(())
}

pub async fn list_people(State(state): State<AppState>) -> Result<Json<Vec<Person>>, ApiError> {
    Ok(Json(state.db.people.list().await?))
}

/// Person with the notes they are linked to.
pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PersonDetail>, ApiError> {
    state
        .db
        .people
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Person not found".to_string()))
}

pub async fn create_person(
    State(state): State<AppState>,
    Json(input): Json<PersonInput>,
) -> Result<(StatusCode, Json<Person>), ApiError> {
    validate(&input)?;
    let person = state.db.people.create(&input).await?;
    info!(
        subsystem = "api",
        component = "people",
        op = "create",
        person_id = person.id,
        "Person created"
    );
    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn update_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<PersonInput>,
) -> Result<Json<Person>, ApiError> {
    validate(&input)?;
    state
        .db
        .people
        .update(id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Person not found".to_string()))
}

pub async fn delete_person(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.db.people.delete(id).await?;
    Ok(success())
}
