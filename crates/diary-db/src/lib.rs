//! # diary-db
//!
//! PostgreSQL persistence and object storage for the life diary backend.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for people, tags, notes, photos, habits,
//!   habit check-ins, ingested events and users
//! - The object store gateway (`StorageBackend`) with a filesystem backend
//!
//! ## Example
//!
//! ```rust,ignore
//! use diary_db::{Database, PersonInput, PersonRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/diary").await?;
//!     let person = db.people.create(&PersonInput {
//!         name: "Ana".to_string(),
//!         ..Default::default()
//!     }).await?;
//!     println!("Created person: {}", person.id);
//!     Ok(())
//! }
//! ```

pub mod events;
pub mod habit_logs;
pub mod habits;
pub mod notes;
pub mod object_store;
pub mod people;
pub mod photos;
pub mod pool;
pub mod tags;
pub mod users;

// Test fixtures for integration tests
pub mod test_fixtures;

// Re-export core types
pub use diary_core::*;

pub use events::{PgDebugLogRepository, PgEventRepository};
pub use habit_logs::PgHabitLogRepository;
pub use habits::PgHabitRepository;
pub use notes::PgNoteRepository;
pub use object_store::{FilesystemBackend, StorageBackend};
pub use people::PgPersonRepository;
pub use photos::PgPhotoRepository;
pub use pool::{create_lazy_pool, create_pool, create_pool_with_config, PoolConfig};
pub use tags::PgTagRepository;
pub use users::PgUserRepository;

/// Escape LIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub people: PgPersonRepository,
    pub tags: PgTagRepository,
    pub notes: PgNoteRepository,
    pub photos: PgPhotoRepository,
    pub habits: PgHabitRepository,
    pub habit_logs: PgHabitLogRepository,
    pub events: PgEventRepository,
    pub debug_logs: PgDebugLogRepository,
    pub users: PgUserRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            people: PgPersonRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            photos: PgPhotoRepository::new(pool.clone()),
            habits: PgHabitRepository::new(pool.clone()),
            habit_logs: PgHabitLogRepository::new(pool.clone()),
            events: PgEventRepository::new(pool.clone()),
            debug_logs: PgDebugLogRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
