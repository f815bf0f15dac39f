//! Habit check-ins, voice notes and progress statistics.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::Json;
use chrono::{Duration, NaiveDate, Utc};
use futures::future::try_join_all;
use serde::Deserialize;
use tracing::{info, warn};

use diary_core::defaults::{DEFAULT_AUDIO_CONTENT_TYPE, DEFAULT_STATS_DAYS, STREAK_LOOKBACK_DAYS};
use diary_core::{audio_url, current_streak, habit_voice_key};
use diary_db::{
    FamilyMemberSummary, Habit, HabitDayStatus, HabitLog, HabitLogEntry, HabitLogRange,
    HabitLogRepository, HabitLogUpdate, HabitRepository, HabitStats,
};

use super::{optional_json_body, parse_date, parse_i64, read_multipart};
use crate::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct LogRangeQuery {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl LogRangeQuery {
    /// A single `date` wins over `start_date`/`end_date`.
    fn into_range(self) -> Result<HabitLogRange, ApiError> {
        if let Some(day) = parse_date(self.date.as_deref(), "date")? {
            return Ok(HabitLogRange::Day(day));
        }
        Ok(HabitLogRange::Between {
            start: parse_date(self.start_date.as_deref(), "start_date")?,
            end: parse_date(self.end_date.as_deref(), "end_date")?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub days: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ToggleBody {
    pub date: Option<NaiveDate>,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn load_habit(state: &AppState, id: i64) -> Result<Habit, ApiError> {
    state
        .db
        .habits
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Habit not found".to_string()))
}

pub async fn list_logs(
    State(state): State<AppState>,
    Path(person_id): Path<i64>,
    Query(query): Query<LogRangeQuery>,
) -> Result<Json<Vec<HabitLogEntry>>, ApiError> {
    let range = query.into_range()?;
    Ok(Json(state.db.habit_logs.list(person_id, range).await?))
}

/// Active habits of a person with today's check-in state.
pub async fn today_status(
    State(state): State<AppState>,
    Path(person_id): Path<i64>,
) -> Result<Json<Vec<HabitDayStatus>>, ApiError> {
    Ok(Json(state.db.habits.day_status(person_id, today()).await?))
}

pub async fn log_habit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<HabitLog>, ApiError> {
    let update: HabitLogUpdate = optional_json_body(&body)?;
    let habit = load_habit(&state, id).await?;
    let date = update.date.unwrap_or_else(today);
    let log = state.db.habit_logs.log(&habit, date, &update).await?;
    Ok(Json(log))
}

pub async fn toggle_habit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<Json<HabitLog>, ApiError> {
    let toggle: ToggleBody = optional_json_body(&body)?;
    let habit = load_habit(&state, id).await?;
    let date = toggle.date.unwrap_or_else(today);
    let log = state.db.habit_logs.toggle(&habit, date).await?;
    info!(
        subsystem = "api",
        component = "habit_logs",
        op = "toggle",
        habit_id = id,
        %date,
        completed = log.completed,
        "Habit toggled"
    );
    Ok(Json(log))
}

/// Store a recorded voice note for a check-in and transcribe it.
pub async fn voice_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<HabitLog>, ApiError> {
    let habit = load_habit(&state, id).await?;

    let (file, fields) = read_multipart(multipart, "audio").await?;
    let file = file
        .filter(|f| !f.data.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No audio file provided".to_string()))?;
    let date_field = fields
        .iter()
        .find(|(name, _)| name == "date")
        .map(|(_, value)| value.as_str());
    let date = parse_date(date_field, "date")?.unwrap_or_else(today);

    let key = habit_voice_key(habit.id, date, Utc::now().timestamp_millis());
    state.storage.write(&key, &file.data).await?;

    let mime_type = file
        .content_type
        .as_deref()
        .unwrap_or(DEFAULT_AUDIO_CONTENT_TYPE);
    let transcription = match &state.transcription {
        Some(backend) => match backend.transcribe(&file.data, mime_type).await {
            Ok(result) => result.text,
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "habit_logs",
                    op = "voice_note",
                    habit_id = id,
                    error = %e,
                    "Voice note transcription failed"
                );
                String::new()
            }
        },
        None => String::new(),
    };

    let log = state
        .db
        .habit_logs
        .attach_voice_note(&habit, date, &audio_url(&key), &transcription)
        .await?;
    info!(
        subsystem = "api",
        component = "habit_logs",
        op = "voice_note",
        habit_id = id,
        %date,
        bytes = file.data.len(),
        transcript_len = transcription.len(),
        "Voice note attached"
    );
    Ok(Json(log))
}

/// Completion counts over the last `days` days plus current streaks.
pub async fn stats(
    State(state): State<AppState>,
    Path(person_id): Path<i64>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Vec<HabitStats>>, ApiError> {
    let days = parse_i64(query.days.as_deref(), "days")?.unwrap_or(DEFAULT_STATS_DAYS);
    if days <= 0 {
        return Err(ApiError::BadRequest("days must be positive".to_string()));
    }
    let today = today();
    let since = today - Duration::days(days);

    let completions = state
        .db
        .habits
        .completion_since(person_id, since, days)
        .await?;

    let habits = &state.db.habits;
    let stats = try_join_all(completions.into_iter().map(|completion| async move {
        let dates = habits
            .completed_dates(completion.habit_id, STREAK_LOOKBACK_DAYS)
            .await?;
        Ok::<_, diary_db::Error>(HabitStats {
            current_streak: current_streak(&dates, today),
            completion,
        })
    }))
    .await?;

    Ok(Json(stats))
}

pub async fn family_summary(
    State(state): State<AppState>,
) -> Result<Json<Vec<FamilyMemberSummary>>, ApiError> {
    Ok(Json(state.db.habits.family_summary(today()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_date_wins_over_range() {
        let range = LogRangeQuery {
            date: Some("2026-03-01".into()),
            start_date: Some("2026-01-01".into()),
            end_date: None,
        }
        .into_range()
        .unwrap();
        assert!(matches!(range, HabitLogRange::Day(d) if d.to_string() == "2026-03-01"));
    }

    #[test]
    fn test_open_range_when_nothing_given() {
        let range = LogRangeQuery::default().into_range().unwrap();
        assert!(matches!(
            range,
            HabitLogRange::Between {
                start: None,
                end: None
            }
        ));
    }

    #[test]
    fn test_invalid_date_is_bad_request() {
        let err = LogRangeQuery {
            start_date: Some("03/01/2026".into()),
            ..Default::default()
        }
        .into_range()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
