//! Habit check-in repository implementation.
//!
//! Each (habit, date) pair has at most one row, enforced by the
//! `habit_logs (habit_id, log_date)` unique constraint. All writes are
//! single-statement upserts against it.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use diary_core::{
    Error, Habit, HabitLog, HabitLogEntry, HabitLogRange, HabitLogRepository, HabitLogUpdate,
    Result,
};

const LOG_COLUMNS: &str = "hl.id, hl.habit_id, hl.person_id, hl.log_date, hl.completed, \
                           hl.count, hl.note, hl.transcription, hl.voice_url, \
                           hl.created_at, hl.updated_at";

fn log_from_row(row: &PgRow) -> HabitLog {
    HabitLog {
        id: row.get("id"),
        habit_id: row.get("habit_id"),
        person_id: row.get("person_id"),
        log_date: row.get("log_date"),
        completed: row.get("completed"),
        count: row.get("count"),
        note: row.get("note"),
        transcription: row.get("transcription"),
        voice_url: row.get("voice_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// PostgreSQL implementation of HabitLogRepository.
#[derive(Clone)]
pub struct PgHabitLogRepository {
    pool: Pool<Postgres>,
}

impl PgHabitLogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HabitLogRepository for PgHabitLogRepository {
    async fn list(&self, person_id: i64, range: HabitLogRange) -> Result<Vec<HabitLogEntry>> {
        let (start, end) = match range {
            HabitLogRange::Day(date) => (Some(date), Some(date)),
            HabitLogRange::Between { start, end } => (start, end),
        };

        let rows = sqlx::query(&format!(
            r#"
            SELECT {}, h.name AS habit_name, h.icon AS habit_icon, h.color AS habit_color
            FROM habit_logs hl
            JOIN habits h ON hl.habit_id = h.id
            WHERE hl.person_id = $1
              AND ($2::date IS NULL OR hl.log_date >= $2)
              AND ($3::date IS NULL OR hl.log_date <= $3)
            ORDER BY hl.log_date DESC, h.sort_order ASC
            "#,
            LOG_COLUMNS
        ))
        .bind(person_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| HabitLogEntry {
                log: log_from_row(row),
                habit_name: row.get("habit_name"),
                habit_icon: row.get("habit_icon"),
                habit_color: row.get("habit_color"),
            })
            .collect())
    }

    async fn log(
        &self,
        habit: &Habit,
        date: NaiveDate,
        update: &HabitLogUpdate,
    ) -> Result<HabitLog> {
        // New rows: missing completed is false, missing count follows completed
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO habit_logs AS hl
                (habit_id, person_id, log_date, completed, count, note, transcription, voice_url)
            VALUES (
                $1, $2, $3,
                COALESCE($4, FALSE),
                COALESCE($5, CASE WHEN COALESCE($4, FALSE) THEN 1 ELSE 0 END),
                $6, $7, $8
            )
            ON CONFLICT (habit_id, log_date) DO UPDATE SET
                completed = COALESCE($4, hl.completed),
                count = COALESCE($5, hl.count),
                note = COALESCE($6, hl.note),
                transcription = COALESCE($7, hl.transcription),
                voice_url = COALESCE($8, hl.voice_url),
                updated_at = NOW()
            RETURNING {}
            "#,
            LOG_COLUMNS
        ))
        .bind(habit.id)
        .bind(habit.person_id)
        .bind(date)
        .bind(update.completed)
        .bind(update.count)
        .bind(&update.note)
        .bind(&update.transcription)
        .bind(&update.voice_url)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(log_from_row(&row))
    }

    async fn toggle(&self, habit: &Habit, date: NaiveDate) -> Result<HabitLog> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO habit_logs AS hl (habit_id, person_id, log_date, completed, count)
            VALUES ($1, $2, $3, TRUE, 1)
            ON CONFLICT (habit_id, log_date) DO UPDATE SET
                completed = NOT hl.completed,
                count = CASE WHEN hl.completed THEN 0 ELSE 1 END,
                updated_at = NOW()
            RETURNING {}
            "#,
            LOG_COLUMNS
        ))
        .bind(habit.id)
        .bind(habit.person_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(log_from_row(&row))
    }

    async fn attach_voice_note(
        &self,
        habit: &Habit,
        date: NaiveDate,
        voice_url: &str,
        transcription: &str,
    ) -> Result<HabitLog> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO habit_logs AS hl
                (habit_id, person_id, log_date, completed, count, voice_url, transcription, note)
            VALUES ($1, $2, $3, FALSE, 0, $4, $5, $5)
            ON CONFLICT (habit_id, log_date) DO UPDATE SET
                voice_url = EXCLUDED.voice_url,
                transcription = EXCLUDED.transcription,
                note = COALESCE(hl.note, '') || ' ' || EXCLUDED.transcription,
                updated_at = NOW()
            RETURNING {}
            "#,
            LOG_COLUMNS
        ))
        .bind(habit.id)
        .bind(habit.person_id)
        .bind(date)
        .bind(voice_url)
        .bind(transcription)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(log_from_row(&row))
    }
}
