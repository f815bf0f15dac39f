//! Habit repository implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::info;

use diary_core::defaults::{
    DEFAULT_HABIT_COLOR, DEFAULT_HABIT_FREQUENCY, DEFAULT_HABIT_ICON, DEFAULT_HABIT_TARGET_COUNT,
};
use diary_core::{
    DefaultHabit, Error, FamilyMemberSummary, Habit, HabitCompletion, HabitDayStatus, HabitInput,
    HabitRepository, InitDefaultsOutcome, Result,
};

use crate::people::{person_from_row, PERSON_COLUMNS};

const HABIT_COLUMNS: &str = "h.id, h.person_id, h.name, h.description, h.frequency, \
                             h.target_count, h.icon, h.color, h.is_active, h.sort_order, \
                             h.created_at, h.updated_at";

pub(crate) fn habit_from_row(row: &PgRow) -> Habit {
    Habit {
        id: row.get("id"),
        person_id: row.get("person_id"),
        name: row.get("name"),
        description: row.get("description"),
        frequency: row.get("frequency"),
        target_count: row.get("target_count"),
        icon: row.get("icon"),
        color: row.get("color"),
        is_active: row.get("is_active"),
        sort_order: row.get("sort_order"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// PostgreSQL implementation of HabitRepository.
#[derive(Clone)]
pub struct PgHabitRepository {
    pool: Pool<Postgres>,
}

impl PgHabitRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HabitRepository for PgHabitRepository {
    async fn get(&self, id: i64) -> Result<Option<Habit>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM habits h WHERE h.id = $1",
            HABIT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(habit_from_row))
    }

    async fn list_for_person(&self, person_id: i64, active_only: bool) -> Result<Vec<Habit>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM habits h
            WHERE h.person_id = $1 AND (NOT $2 OR h.is_active)
            ORDER BY h.sort_order ASC, h.created_at ASC
            "#,
            HABIT_COLUMNS
        ))
        .bind(person_id)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(habit_from_row).collect())
    }

    async fn create(&self, person_id: i64, input: &HabitInput) -> Result<Habit> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO habits AS h
                (person_id, name, description, frequency, target_count, icon, color, is_active, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            HABIT_COLUMNS
        ))
        .bind(person_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.frequency.as_deref().unwrap_or(DEFAULT_HABIT_FREQUENCY))
        .bind(input.target_count.unwrap_or(DEFAULT_HABIT_TARGET_COUNT))
        .bind(input.icon.as_deref().unwrap_or(DEFAULT_HABIT_ICON))
        .bind(input.color.as_deref().unwrap_or(DEFAULT_HABIT_COLOR))
        .bind(input.is_active.unwrap_or(true))
        .bind(input.sort_order.unwrap_or(0))
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(habit_from_row(&row))
    }

    async fn update(&self, id: i64, input: &HabitInput) -> Result<Option<Habit>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE habits AS h SET
                name = $1, description = $2, frequency = $3, target_count = $4,
                icon = $5, color = $6, is_active = $7, sort_order = $8,
                updated_at = NOW()
            WHERE h.id = $9
            RETURNING {}
            "#,
            HABIT_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.frequency.as_deref().unwrap_or(DEFAULT_HABIT_FREQUENCY))
        .bind(input.target_count.unwrap_or(DEFAULT_HABIT_TARGET_COUNT))
        .bind(input.icon.as_deref().unwrap_or(DEFAULT_HABIT_ICON))
        .bind(input.color.as_deref().unwrap_or(DEFAULT_HABIT_COLOR))
        .bind(input.is_active.unwrap_or(true))
        .bind(input.sort_order.unwrap_or(0))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(habit_from_row))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM habits WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn list_defaults(&self) -> Result<Vec<DefaultHabit>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, icon, color, sort_order
            FROM default_habits
            ORDER BY sort_order ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| DefaultHabit {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
                icon: row.get("icon"),
                color: row.get("color"),
                sort_order: row.get("sort_order"),
            })
            .collect())
    }

    async fn init_defaults(&self, person_id: i64) -> Result<InitDefaultsOutcome> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Row lock serializes concurrent seeding of the same person
        let person: Option<i64> =
            sqlx::query_scalar("SELECT id FROM people WHERE id = $1 FOR UPDATE")
                .bind(person_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if person.is_none() {
            return Err(Error::NotFound("Person not found".to_string()));
        }

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM habits WHERE person_id = $1")
                .bind(person_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if existing > 0 {
            return Ok(InitDefaultsOutcome::AlreadyInitialized(existing));
        }

        sqlx::query(
            r#"
            INSERT INTO habits (person_id, name, description, icon, color, sort_order)
            SELECT $1, name, description, icon, color, sort_order
            FROM default_habits
            ORDER BY sort_order ASC
            "#,
        )
        .bind(person_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let rows = sqlx::query(&format!(
            "SELECT {} FROM habits h WHERE h.person_id = $1 ORDER BY h.sort_order ASC",
            HABIT_COLUMNS
        ))
        .bind(person_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "habits",
            op = "init_defaults",
            person_id,
            created = rows.len(),
            "Seeded default habits"
        );

        Ok(InitDefaultsOutcome::Created(
            rows.iter().map(habit_from_row).collect(),
        ))
    }

    async fn day_status(&self, person_id: i64, date: NaiveDate) -> Result<Vec<HabitDayStatus>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {},
                   hl.id AS log_id, hl.completed, hl.count AS log_count,
                   hl.note, hl.transcription
            FROM habits h
            LEFT JOIN habit_logs hl ON h.id = hl.habit_id AND hl.log_date = $1
            WHERE h.person_id = $2 AND h.is_active
            ORDER BY h.sort_order ASC
            "#,
            HABIT_COLUMNS
        ))
        .bind(date)
        .bind(person_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| HabitDayStatus {
                habit: habit_from_row(row),
                log_id: row.get("log_id"),
                completed: row.get("completed"),
                log_count: row.get("log_count"),
                note: row.get("note"),
                transcription: row.get("transcription"),
            })
            .collect())
    }

    async fn completion_since(
        &self,
        person_id: i64,
        since: NaiveDate,
        window_days: i64,
    ) -> Result<Vec<HabitCompletion>> {
        let rows = sqlx::query(
            r#"
            SELECT h.id AS habit_id, h.name, h.icon, h.color,
                   COUNT(hl.id) FILTER (WHERE hl.completed) AS completed_count,
                   COUNT(hl.id) AS total_logs
            FROM habits h
            LEFT JOIN habit_logs hl ON h.id = hl.habit_id AND hl.log_date >= $1
            WHERE h.person_id = $2 AND h.is_active
            GROUP BY h.id
            ORDER BY h.sort_order ASC
            "#,
        )
        .bind(since)
        .bind(person_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| HabitCompletion {
                habit_id: row.get("habit_id"),
                name: row.get("name"),
                icon: row.get("icon"),
                color: row.get("color"),
                completed_count: row.get("completed_count"),
                total_logs: row.get("total_logs"),
                total_days: window_days,
            })
            .collect())
    }

    async fn completed_dates(&self, habit_id: i64, limit: i64) -> Result<Vec<NaiveDate>> {
        let dates: Vec<NaiveDate> = sqlx::query_scalar(
            r#"
            SELECT log_date FROM habit_logs
            WHERE habit_id = $1 AND completed
            ORDER BY log_date DESC
            LIMIT $2
            "#,
        )
        .bind(habit_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(dates)
    }

    async fn family_summary(&self, date: NaiveDate) -> Result<Vec<FamilyMemberSummary>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {},
                   COUNT(h.id) AS total_habits,
                   COUNT(hl.id) FILTER (WHERE hl.completed) AS completed_habits
            FROM people p
            LEFT JOIN habits h ON h.person_id = p.id AND h.is_active
            LEFT JOIN habit_logs hl ON hl.habit_id = h.id AND hl.log_date = $1
            GROUP BY p.id
            ORDER BY p.name ASC
            "#,
            PERSON_COLUMNS
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| {
                FamilyMemberSummary::new(
                    person_from_row(row),
                    row.get("total_habits"),
                    row.get("completed_habits"),
                )
            })
            .collect())
    }
}
