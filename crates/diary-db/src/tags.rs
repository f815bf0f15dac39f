//! Tag repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use diary_core::defaults::DEFAULT_TAG_COLOR;
use diary_core::{Error, Result, Tag, TagInput, TagRepository};

pub(crate) fn tag_from_row(row: &PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    }
}

fn map_unique_violation(e: sqlx::Error) -> Error {
    let err = Error::Database(e);
    if err.is_unique_violation() {
        Error::Conflict("Tag already exists".to_string())
    } else {
        err
    }
}

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name, color, created_at FROM tags ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    async fn create(&self, input: &TagInput) -> Result<Tag> {
        let row = sqlx::query(
            "INSERT INTO tags (name, color) VALUES ($1, $2) RETURNING id, name, color, created_at",
        )
        .bind(&input.name)
        .bind(input.color.as_deref().unwrap_or(DEFAULT_TAG_COLOR))
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(tag_from_row(&row))
    }

    async fn update(&self, id: i64, input: &TagInput) -> Result<Option<Tag>> {
        let row = sqlx::query(
            r#"
            UPDATE tags SET name = $1, color = $2
            WHERE id = $3
            RETURNING id, name, color, created_at
            "#,
        )
        .bind(&input.name)
        .bind(input.color.as_deref().unwrap_or(DEFAULT_TAG_COLOR))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        Ok(row.as_ref().map(tag_from_row))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
