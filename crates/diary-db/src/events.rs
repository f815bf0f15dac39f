//! Repositories for ingested voice events, their extracted data and the raw
//! webhook debug log.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use diary_core::{
    DebugLogRepository, Error, Event, EventData, EventDataEntry, EventExtraction,
    EventRepository, NewEvent, Result, TelegramDebugLog,
};

/// PostgreSQL implementation of EventRepository.
#[derive(Clone)]
pub struct PgEventRepository {
    pool: Pool<Postgres>,
}

impl PgEventRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn insert(&self, event: &NewEvent) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO events (telegram_file_id, audio_url, transcription, raw_metadata)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&event.telegram_file_id)
        .bind(&event.audio_url)
        .bind(&event.transcription)
        .bind(&event.raw_metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn store_extraction(&self, event_id: i64, extraction: &EventExtraction) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        for (key, value) in extraction.to_pairs() {
            sqlx::query("INSERT INTO event_data (event_id, key, value) VALUES ($1, $2, $3)")
                .bind(event_id)
                .bind(key)
                .bind(value)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
        }

        let updated = sqlx::query("UPDATE events SET processed = TRUE WHERE id = $1")
            .bind(event_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if updated.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Event {} not found", event_id)));
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "events",
            op = "store_extraction",
            event_id,
            "Stored extracted event data"
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            r#"
            SELECT id, telegram_file_id, audio_url, transcription, raw_metadata, processed, created_at
            FROM events
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| Event {
                id: row.get("id"),
                telegram_file_id: row.get("telegram_file_id"),
                audio_url: row.get("audio_url"),
                transcription: row.get("transcription"),
                raw_metadata: row.get("raw_metadata"),
                processed: row.get("processed"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn list_data(&self, event_id: Option<i64>) -> Result<Vec<EventDataEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT ed.id, ed.event_id, ed.key, ed.value, ed.created_at,
                   e.transcription AS event_preview
            FROM event_data ed
            JOIN events e ON ed.event_id = e.id
            WHERE ($1::bigint IS NULL OR ed.event_id = $1)
            ORDER BY ed.created_at DESC, ed.id ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| EventDataEntry {
                data: EventData {
                    id: row.get("id"),
                    event_id: row.get("event_id"),
                    key: row.get("key"),
                    value: row.get("value"),
                    created_at: row.get("created_at"),
                },
                event_preview: row.get("event_preview"),
            })
            .collect())
    }
}

/// PostgreSQL implementation of DebugLogRepository.
#[derive(Clone)]
pub struct PgDebugLogRepository {
    pool: Pool<Postgres>,
}

impl PgDebugLogRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DebugLogRepository for PgDebugLogRepository {
    async fn record(&self, payload: &str, sender: &str) -> Result<()> {
        sqlx::query("INSERT INTO telegram_debug_logs (payload, sender) VALUES ($1, $2)")
            .bind(payload)
            .bind(sender)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<TelegramDebugLog>> {
        let rows = sqlx::query(
            r#"
            SELECT id, payload, sender, created_at
            FROM telegram_debug_logs
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| TelegramDebugLog {
                id: row.get("id"),
                payload: row.get("payload"),
                sender: row.get("sender"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
