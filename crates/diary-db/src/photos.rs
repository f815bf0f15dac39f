//! Note photo repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use diary_core::{Error, NewPhoto, Photo, PhotoRepository, Result};

pub(crate) const PHOTO_COLUMNS: &str =
    "id, note_id, photo_url, caption, file_name, file_size, mime_type, created_at";

pub(crate) fn photo_from_row(row: &PgRow) -> Photo {
    Photo {
        id: row.get("id"),
        note_id: row.get("note_id"),
        photo_url: row.get("photo_url"),
        caption: row.get("caption"),
        file_name: row.get("file_name"),
        file_size: row.get("file_size"),
        mime_type: row.get("mime_type"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of PhotoRepository.
#[derive(Clone)]
pub struct PgPhotoRepository {
    pool: Pool<Postgres>,
}

impl PgPhotoRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PhotoRepository for PgPhotoRepository {
    async fn create(&self, photo: &NewPhoto) -> Result<Photo> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO note_photos (note_id, photo_url, caption, file_name, file_size, mime_type)
            VALUES ($1, $2, NULL, $3, $4, $5)
            RETURNING {}
            "#,
            PHOTO_COLUMNS
        ))
        .bind(photo.note_id)
        .bind(&photo.photo_url)
        .bind(&photo.file_name)
        .bind(photo.file_size)
        .bind(&photo.mime_type)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(photo_from_row(&row))
    }

    async fn get(&self, id: i64) -> Result<Option<Photo>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM note_photos WHERE id = $1",
            PHOTO_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(photo_from_row))
    }

    async fn list_for_note(&self, note_id: i64) -> Result<Vec<Photo>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM note_photos WHERE note_id = $1 ORDER BY created_at ASC",
            PHOTO_COLUMNS
        ))
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(photo_from_row).collect())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM note_photos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
