//! Person repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};

use diary_core::{
    Error, LinkedNote, Person, PersonDetail, PersonInput, PersonRepository, PersonSearch, Result,
};

use crate::escape_like;
use crate::notes::note_from_row;

pub(crate) const PERSON_COLUMNS: &str =
    "p.id, p.name, p.relationship, p.notes, p.avatar_url, p.created_at, p.updated_at";

pub(crate) fn person_from_row(row: &PgRow) -> Person {
    Person {
        id: row.get("id"),
        name: row.get("name"),
        relationship: row.get("relationship"),
        notes: row.get("notes"),
        avatar_url: row.get("avatar_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// PostgreSQL implementation of PersonRepository.
#[derive(Clone)]
pub struct PgPersonRepository {
    pool: Pool<Postgres>,
}

impl PgPersonRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PersonRepository for PgPersonRepository {
    async fn list(&self) -> Result<Vec<Person>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM people p ORDER BY p.name ASC",
            PERSON_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(person_from_row).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Person>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM people p WHERE p.id = $1",
            PERSON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(person_from_row))
    }

    async fn get_detail(&self, id: i64) -> Result<Option<PersonDetail>> {
        let person = match self.get(id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let rows = sqlx::query(
            r#"
            SELECT n.id, n.title, n.content, n.category, n.importance, n.event_date,
                   n.event_id, n.created_at, n.updated_at, np.role
            FROM notes n
            JOIN note_people np ON n.id = np.note_id
            WHERE np.person_id = $1
            ORDER BY n.event_date DESC NULLS LAST, n.created_at DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let linked_notes = rows
            .iter()
            .map(|row| LinkedNote {
                note: note_from_row(row),
                role: row.get("role"),
            })
            .collect();

        Ok(Some(PersonDetail {
            person,
            linked_notes,
        }))
    }

    async fn create(&self, input: &PersonInput) -> Result<Person> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO people AS p (name, relationship, notes, avatar_url)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            PERSON_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.relationship)
        .bind(&input.notes)
        .bind(&input.avatar_url)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(person_from_row(&row))
    }

    async fn update(&self, id: i64, input: &PersonInput) -> Result<Option<Person>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE people AS p
            SET name = $1, relationship = $2, notes = $3, avatar_url = $4, updated_at = NOW()
            WHERE p.id = $5
            RETURNING {}
            "#,
            PERSON_COLUMNS
        ))
        .bind(&input.name)
        .bind(&input.relationship)
        .bind(&input.notes)
        .bind(&input.avatar_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(person_from_row))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM people WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl PersonSearch for PgPersonRepository {
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Person>> {
        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM people p
            WHERE p.name LIKE $1 ESCAPE '\' OR p.notes LIKE $1 ESCAPE '\'
            ORDER BY p.name ASC
            LIMIT $2
            "#,
            PERSON_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(person_from_row).collect())
    }
}
