//! Habit definition handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use diary_db::{
    DefaultHabit, Habit, HabitInput, HabitRepository, InitDefaultsOutcome, PersonRepository,
};

use super::success;
use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct HabitListQuery {
    pub active: Option<String>,
}

fn validate(input: &HabitInput) -> Result<(), ApiError> {
    if input.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    Ok(())
}

pub async fn list_default_habits(
    State(state): State<AppState>,
) -> Result<Json<Vec<DefaultHabit>>, ApiError> {
    Ok(Json(state.db.habits.list_defaults().await?))
}

/// A person's habits; `?active=true` limits to active ones.
pub async fn list_habits(
    State(state): State<AppState>,
    Path(person_id): Path<i64>,
    Query(query): Query<HabitListQuery>,
) -> Result<Json<Vec<Habit>>, ApiError> {
    let active_only = query.active.as_deref() == Some("true");
    Ok(Json(
        state
            .db
            .habits
            .list_for_person(person_id, active_only)
            .await?,
    ))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Path(person_id): Path<i64>,
    Json(input): Json<HabitInput>,
) -> Result<(StatusCode, Json<Habit>), ApiError> {
    validate(&input)?;
    if state.db.people.get(person_id).await?.is_none() {
        return Err(ApiError::NotFound("Person not found".to_string()));
    }
    let habit = state.db.habits.create(person_id, &input).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

/// Seed a person's habits from the templates, once.
pub async fn init_default_habits(
    State(state): State<AppState>,
    Path(person_id): Path<i64>,
) -> Result<Response, ApiError> {
    match state.db.habits.init_defaults(person_id).await? {
        InitDefaultsOutcome::AlreadyInitialized(count) => Ok(Json(json!({
            "message": "Person already has habits",
            "count": count,
        }))
        .into_response()),
        InitDefaultsOutcome::Created(habits) => {
            info!(
                subsystem = "api",
                component = "habits",
                op = "init_defaults",
                person_id,
                created = habits.len(),
                "Default habits created"
            );
            Ok((StatusCode::CREATED, Json(habits)).into_response())
        }
    }
}

pub async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<HabitInput>,
) -> Result<Json<Habit>, ApiError> {
    validate(&input)?;
    state
        .db
        .habits
        .update(id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Habit not found".to_string()))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    state.db.habits.delete(id).await?;
    Ok(success())
}
