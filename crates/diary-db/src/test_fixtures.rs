//! Test fixtures for database integration tests.
//!
//! Integration tests run only when `DATABASE_URL` points at a PostgreSQL
//! instance the tests may migrate and write to. Without it,
//! [`TestDatabase::from_env`] returns `None` and callers skip.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diary_db::test_fixtures::TestDatabase;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let Some(test_db) = TestDatabase::from_env().await else {
//!         return;
//!     };
//!     let person = test_db.person("Ana").await;
//!     // ...
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    Database, HabitInput, HabitRepository, NoteInput, NoteRepository, PersonInput,
    PersonRepository, PoolConfig, TagInput, TagRepository,
};
use diary_core::{Habit, Note, Person, Tag};

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Name unique across tests sharing one database.
pub fn unique_name(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{}-{}-{}", prefix, nanos, n)
}

/// Migrated test database with small data builders.
pub struct TestDatabase {
    pub db: Database,
}

impl TestDatabase {
    /// Connect to `DATABASE_URL` and apply migrations; `None` when unset.
    pub async fn from_env() -> Option<Self> {
        let Ok(url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping database test");
            return None;
        };

        let db = Database::connect_with_config(&url, PoolConfig::new().max_connections(5))
            .await
            .expect("Failed to connect to test database");
        #[cfg(feature = "migrations")]
        db.migrate().await.expect("Failed to run migrations");

        Some(Self { db })
    }

    pub async fn person(&self, name: &str) -> Person {
        self.db
            .people
            .create(&PersonInput {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .expect("Failed to create person")
    }

    pub async fn tag(&self, prefix: &str) -> Tag {
        self.db
            .tags
            .create(&TagInput {
                name: unique_name(prefix),
                color: None,
            })
            .await
            .expect("Failed to create tag")
    }

    pub async fn note(&self, content: &str) -> Note {
        self.db
            .notes
            .create(&NoteInput {
                content: content.to_string(),
                ..Default::default()
            })
            .await
            .expect("Failed to create note")
    }

    pub async fn habit(&self, person_id: i64, name: &str) -> Habit {
        self.db
            .habits
            .create(
                person_id,
                &HabitInput {
                    name: name.to_string(),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to create habit")
    }
}
