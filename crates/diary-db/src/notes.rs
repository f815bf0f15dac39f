//! Note repository implementation.
//!
//! A note owns its people/tag associations and its photos. Writes that touch
//! the note row and its associations run in a single transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};
use tracing::debug;

use diary_core::defaults::DEFAULT_NOTE_CATEGORY;
use diary_core::{
    CategoryCount, Error, Note, NoteFilter, NoteFull, NoteInput, NotePerson, NoteRepository,
    Photo, Result, Tag,
};

use crate::escape_like;
use crate::people::person_from_row;
use crate::photos::{photo_from_row, PHOTO_COLUMNS};
use crate::tags::tag_from_row;

const NOTE_COLUMNS: &str = "n.id, n.title, n.content, n.category, n.importance, n.event_date, \
                            n.event_id, n.created_at, n.updated_at";

pub(crate) fn note_from_row(row: &PgRow) -> Note {
    let importance: String = row.get("importance");
    Note {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        category: row.get("category"),
        importance: importance.parse().unwrap_or_default(),
        event_date: row.get("event_date"),
        event_id: row.get("event_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Map FK violations on association inserts to a client error.
fn map_association_error(e: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return Error::InvalidInput("Unknown person or tag id".to_string());
        }
    }
    Error::Database(e)
}

/// Relations of a set of notes, keyed by note id.
#[derive(Default)]
struct NoteRelations {
    people: HashMap<i64, Vec<NotePerson>>,
    tags: HashMap<i64, Vec<Tag>>,
    photos: HashMap<i64, Vec<Photo>>,
}

impl NoteRelations {
    fn attach(&mut self, note: Note) -> NoteFull {
        let id = note.id;
        NoteFull {
            note,
            people: self.people.remove(&id).unwrap_or_default(),
            tags: self.tags.remove(&id).unwrap_or_default(),
            photos: self.photos.remove(&id).unwrap_or_default(),
        }
    }
}

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Load people, tags and photos for all `note_ids` with one query each.
    async fn load_relations(&self, note_ids: &[i64]) -> Result<NoteRelations> {
        if note_ids.is_empty() {
            return Ok(NoteRelations::default());
        }

        let people_sql = format!(
            r#"
            SELECT np.note_id, np.role, {}
            FROM note_people np
            JOIN people p ON p.id = np.person_id
            WHERE np.note_id = ANY($1)
            ORDER BY p.name ASC
            "#,
            crate::people::PERSON_COLUMNS
        );
        let photos_sql = format!(
            "SELECT {} FROM note_photos WHERE note_id = ANY($1) ORDER BY created_at ASC",
            PHOTO_COLUMNS
        );

        let people_fut = sqlx::query(&people_sql)
            .bind(note_ids)
            .fetch_all(&self.pool);
        let tags_fut = sqlx::query(
            r#"
            SELECT nt.note_id, t.id, t.name, t.color, t.created_at
            FROM note_tags nt
            JOIN tags t ON t.id = nt.tag_id
            WHERE nt.note_id = ANY($1)
            ORDER BY t.name ASC
            "#,
        )
        .bind(note_ids)
        .fetch_all(&self.pool);
        let photos_fut = sqlx::query(&photos_sql)
            .bind(note_ids)
            .fetch_all(&self.pool);

        let (people_rows, tag_rows, photo_rows) =
            futures::try_join!(people_fut, tags_fut, photos_fut).map_err(Error::Database)?;

        let mut relations = NoteRelations::default();
        for row in &people_rows {
            relations
                .people
                .entry(row.get("note_id"))
                .or_default()
                .push(NotePerson {
                    person: person_from_row(row),
                    role: row.get("role"),
                });
        }
        for row in &tag_rows {
            relations
                .tags
                .entry(row.get("note_id"))
                .or_default()
                .push(tag_from_row(row));
        }
        for row in &photo_rows {
            let photo = photo_from_row(row);
            relations.photos.entry(photo.note_id).or_default().push(photo);
        }

        debug!(
            subsystem = "database",
            component = "notes",
            op = "load_relations",
            note_count = note_ids.len(),
            people = people_rows.len(),
            tags = tag_rows.len(),
            photos = photo_rows.len(),
            "Loaded note relations"
        );

        Ok(relations)
    }

    /// Replace both association sets of a note inside `tx`.
    async fn replace_associations_tx(
        tx: &mut Transaction<'_, Postgres>,
        note_id: i64,
        input: &NoteInput,
    ) -> Result<()> {
        sqlx::query("DELETE FROM note_people WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        sqlx::query("DELETE FROM note_tags WHERE note_id = $1")
            .bind(note_id)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;

        for person in &input.people {
            sqlx::query(
                r#"
                INSERT INTO note_people (note_id, person_id, role) VALUES ($1, $2, $3)
                ON CONFLICT (note_id, person_id) DO UPDATE SET role = EXCLUDED.role
                "#,
            )
            .bind(note_id)
            .bind(person.id)
            .bind(&person.role)
            .execute(&mut **tx)
            .await
            .map_err(map_association_error)?;
        }

        for tag_id in &input.tags {
            sqlx::query(
                "INSERT INTO note_tags (note_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(note_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await
            .map_err(map_association_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn list(&self, filter: &NoteFilter) -> Result<Vec<NoteFull>> {
        let mut conditions: Vec<String> = Vec::new();
        let mut param_idx = 1;

        if filter.category.is_some() {
            conditions.push(format!("n.category = ${}", param_idx));
            param_idx += 1;
        }
        if filter.person_id.is_some() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM note_people np WHERE np.note_id = n.id AND np.person_id = ${})",
                param_idx
            ));
            param_idx += 1;
        }
        if filter.tag_id.is_some() {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM note_tags nt WHERE nt.note_id = n.id AND nt.tag_id = ${})",
                param_idx
            ));
            param_idx += 1;
        }
        if filter.search.is_some() {
            conditions.push(format!(
                "(n.title LIKE ${0} ESCAPE '\\' OR n.content LIKE ${0} ESCAPE '\\')",
                param_idx
            ));
            param_idx += 1;
        }
        if filter.start_date.is_some() {
            conditions.push(format!("n.event_date >= ${}", param_idx));
            param_idx += 1;
        }
        if filter.end_date.is_some() {
            conditions.push(format!("n.event_date <= ${}", param_idx));
            param_idx += 1;
        }
        if filter.importance.is_some() {
            conditions.push(format!("n.importance = ${}", param_idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM notes n {} ORDER BY n.event_date DESC NULLS LAST, n.created_at DESC",
            NOTE_COLUMNS, where_clause
        );

        let mut query = sqlx::query(&sql);
        if let Some(category) = &filter.category {
            query = query.bind(category);
        }
        if let Some(person_id) = filter.person_id {
            query = query.bind(person_id);
        }
        if let Some(tag_id) = filter.tag_id {
            query = query.bind(tag_id);
        }
        if let Some(search) = &filter.search {
            query = query.bind(format!("%{}%", escape_like(search)));
        }
        if let Some(start) = filter.start_date {
            query = query.bind(start);
        }
        if let Some(end) = filter.end_date {
            query = query.bind(end);
        }
        if let Some(importance) = filter.importance {
            query = query.bind(importance.as_str());
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        let notes: Vec<Note> = rows.iter().map(note_from_row).collect();
        let ids: Vec<i64> = notes.iter().map(|n| n.id).collect();

        let mut relations = self.load_relations(&ids).await?;
        Ok(notes.into_iter().map(|n| relations.attach(n)).collect())
    }

    async fn fetch(&self, id: i64) -> Result<Option<NoteFull>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM notes n WHERE n.id = $1",
            NOTE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let note = match row {
            Some(row) => note_from_row(&row),
            None => return Ok(None),
        };
        let mut relations = self.load_relations(&[id]).await?;
        Ok(Some(relations.attach(note)))
    }

    async fn create(&self, input: &NoteInput) -> Result<Note> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO notes AS n (title, content, category, importance, event_date, event_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.category.as_deref().unwrap_or(DEFAULT_NOTE_CATEGORY))
        .bind(input.importance.unwrap_or_default().as_str())
        .bind(input.event_date)
        .bind(input.event_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let note = note_from_row(&row);

        Self::replace_associations_tx(&mut tx, note.id, input).await?;
        tx.commit().await.map_err(Error::Database)?;

        Ok(note)
    }

    async fn update(&self, id: i64, input: &NoteInput) -> Result<Option<Note>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE notes AS n
            SET title = $1, content = $2, category = $3, importance = $4, event_date = $5,
                event_id = COALESCE($6, n.event_id), updated_at = NOW()
            WHERE n.id = $7
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(&input.title)
        .bind(&input.content)
        .bind(input.category.as_deref().unwrap_or(DEFAULT_NOTE_CATEGORY))
        .bind(input.importance.unwrap_or_default().as_str())
        .bind(input.event_date)
        .bind(input.event_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let note = match row {
            Some(row) => note_from_row(&row),
            None => return Ok(None),
        };

        Self::replace_associations_tx(&mut tx, id, input).await?;
        tx.commit().await.map_err(Error::Database)?;

        Ok(Some(note))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM notes WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(exists)
    }

    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Note>> {
        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM notes n
            WHERE n.title LIKE $1 ESCAPE '\' OR n.content LIKE $1 ESCAPE '\'
            ORDER BY n.created_at DESC
            LIMIT $2
            "#,
            NOTE_COLUMNS
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        let rows = sqlx::query(
            r#"
            SELECT category, COUNT(*) AS count
            FROM notes
            GROUP BY category
            ORDER BY count DESC, category ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .iter()
            .map(|row| CategoryCount {
                category: row.get("category"),
                count: row.get("count"),
            })
            .collect())
    }
}
