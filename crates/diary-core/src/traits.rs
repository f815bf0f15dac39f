//! Core traits for the diary's persistence and inference seams.
//!
//! The PostgreSQL repositories in `diary-db` and the HTTP adapters in
//! `diary-inference` implement these; the ingestion pipeline and the API
//! services depend only on the traits.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// PEOPLE
// =============================================================================

/// Fields accepted when creating or updating a person.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonInput {
    pub name: String,
    pub relationship: Option<String>,
    pub notes: Option<String>,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait PersonRepository: Send + Sync {
    /// All people ordered by name.
    async fn list(&self) -> Result<Vec<Person>>;

    async fn get(&self, id: i64) -> Result<Option<Person>>;

    /// Person with linked notes, newest event first.
    async fn get_detail(&self, id: i64) -> Result<Option<PersonDetail>>;

    async fn create(&self, input: &PersonInput) -> Result<Person>;

    /// Returns `None` when the person does not exist.
    async fn update(&self, id: i64, input: &PersonInput) -> Result<Option<Person>>;

    async fn delete(&self, id: i64) -> Result<()>;
}

// =============================================================================
// TAGS
// =============================================================================

/// Fields accepted when creating or updating a tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagInput {
    pub name: String,
    pub color: Option<String>,
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Fails with `Error::Conflict` when the name is taken.
    async fn create(&self, input: &TagInput) -> Result<Tag>;

    async fn update(&self, id: i64, input: &TagInput) -> Result<Option<Tag>>;

    async fn delete(&self, id: i64) -> Result<()>;
}

// =============================================================================
// NOTES
// =============================================================================

/// A person reference inside a note payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotePersonLink {
    pub id: i64,
    #[serde(default)]
    pub role: Option<String>,
}

/// Fields accepted when creating or updating a note.
///
/// `people` and `tags` replace the note's associations wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteInput {
    pub title: Option<String>,
    pub content: String,
    pub category: Option<String>,
    pub importance: Option<Importance>,
    pub event_date: Option<NaiveDate>,
    pub event_id: Option<i64>,
    pub people: Vec<NotePersonLink>,
    pub tags: Vec<i64>,
}

/// Filters for listing notes. All are optional and combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteFilter {
    pub category: Option<String>,
    pub person_id: Option<i64>,
    pub tag_id: Option<i64>,
    /// Substring of title or content.
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub importance: Option<Importance>,
}

#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Notes matching the filter with people, tags and photos attached.
    async fn list(&self, filter: &NoteFilter) -> Result<Vec<NoteFull>>;

    async fn fetch(&self, id: i64) -> Result<Option<NoteFull>>;

    /// Insert the note and its associations in one transaction.
    async fn create(&self, input: &NoteInput) -> Result<Note>;

    /// Update the row and replace both association sets in one transaction.
    async fn update(&self, id: i64, input: &NoteInput) -> Result<Option<Note>>;

    /// Delete the note row; photos and associations cascade.
    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists(&self, id: i64) -> Result<bool>;

    /// Case-sensitive substring search on title and content.
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Note>>;

    /// Note counts per category, most used first.
    async fn category_counts(&self) -> Result<Vec<CategoryCount>>;
}

/// Search over people names and free-text notes.
#[async_trait]
pub trait PersonSearch: Send + Sync {
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<Person>>;
}

// =============================================================================
// PHOTOS
// =============================================================================

/// Metadata for a freshly stored photo blob.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub note_id: i64,
    pub photo_url: String,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
}

#[async_trait]
pub trait PhotoRepository: Send + Sync {
    async fn create(&self, photo: &NewPhoto) -> Result<Photo>;

    async fn get(&self, id: i64) -> Result<Option<Photo>>;

    async fn list_for_note(&self, note_id: i64) -> Result<Vec<Photo>>;

    async fn delete(&self, id: i64) -> Result<()>;
}

// =============================================================================
// HABITS
// =============================================================================

/// Fields accepted when creating or updating a habit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitInput {
    pub name: String,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub target_count: Option<i32>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Result of seeding a person's habits from the templates.
#[derive(Debug, Clone)]
pub enum InitDefaultsOutcome {
    /// The person already had this many habits; nothing was created.
    AlreadyInitialized(i64),
    Created(Vec<Habit>),
}

#[async_trait]
pub trait HabitRepository: Send + Sync {
    async fn get(&self, id: i64) -> Result<Option<Habit>>;

    /// A person's habits ordered by `sort_order`, optionally active only.
    async fn list_for_person(&self, person_id: i64, active_only: bool) -> Result<Vec<Habit>>;

    async fn create(&self, person_id: i64, input: &HabitInput) -> Result<Habit>;

    async fn update(&self, id: i64, input: &HabitInput) -> Result<Option<Habit>>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn list_defaults(&self) -> Result<Vec<DefaultHabit>>;

    /// Copy the templates to a person that has no habits yet.
    async fn init_defaults(&self, person_id: i64) -> Result<InitDefaultsOutcome>;

    /// Active habits of a person with their check-in for `date`.
    async fn day_status(&self, person_id: i64, date: NaiveDate) -> Result<Vec<HabitDayStatus>>;

    /// Completion counts per active habit for logs on or after `since`.
    async fn completion_since(
        &self,
        person_id: i64,
        since: NaiveDate,
        window_days: i64,
    ) -> Result<Vec<HabitCompletion>>;

    /// Most recent completed log dates of a habit, newest first.
    async fn completed_dates(&self, habit_id: i64, limit: i64) -> Result<Vec<NaiveDate>>;

    /// Today's progress for every person.
    async fn family_summary(&self, date: NaiveDate) -> Result<Vec<FamilyMemberSummary>>;
}

// =============================================================================
// HABIT LOGS
// =============================================================================

/// Which logs to return for a person.
#[derive(Debug, Clone, Copy)]
pub enum HabitLogRange {
    Day(NaiveDate),
    /// Inclusive bounds; a missing bound is open.
    Between {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

/// Any subset of check-in fields to set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitLogUpdate {
    pub date: Option<NaiveDate>,
    pub completed: Option<bool>,
    pub count: Option<i32>,
    pub note: Option<String>,
    pub transcription: Option<String>,
    pub voice_url: Option<String>,
}

#[async_trait]
pub trait HabitLogRepository: Send + Sync {
    async fn list(&self, person_id: i64, range: HabitLogRange) -> Result<Vec<HabitLogEntry>>;

    /// Create or overwrite the check-in of `habit` on `date`.
    async fn log(&self, habit: &Habit, date: NaiveDate, update: &HabitLogUpdate)
        -> Result<HabitLog>;

    /// Flip completion; a missing check-in becomes completed with count 1.
    async fn toggle(&self, habit: &Habit, date: NaiveDate) -> Result<HabitLog>;

    /// Attach a voice recording and append its transcription to the note.
    async fn attach_voice_note(
        &self,
        habit: &Habit,
        date: NaiveDate,
        voice_url: &str,
        transcription: &str,
    ) -> Result<HabitLog>;
}

// =============================================================================
// INGESTED EVENTS
// =============================================================================

/// Row written for each ingested voice message.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub telegram_file_id: String,
    pub audio_url: String,
    pub transcription: String,
    pub raw_metadata: JsonValue,
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert the event and return its id.
    async fn insert(&self, event: &NewEvent) -> Result<i64>;

    /// Store the extracted fields and mark the event processed, atomically.
    async fn store_extraction(&self, event_id: i64, extraction: &EventExtraction) -> Result<()>;

    /// Events newest first.
    async fn list(&self) -> Result<Vec<Event>>;

    async fn list_data(&self, event_id: Option<i64>) -> Result<Vec<EventDataEntry>>;
}

#[async_trait]
pub trait DebugLogRepository: Send + Sync {
    async fn record(&self, payload: &str, sender: &str) -> Result<()>;

    async fn recent(&self, limit: i64) -> Result<Vec<TelegramDebugLog>>;
}

// =============================================================================
// USERS
// =============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up by email or display name.
    async fn find_by_login(&self, login: &str) -> Result<Option<UserCredentials>>;

    async fn find_by_token(&self, token: &str) -> Result<Option<User>>;

    async fn set_token(&self, user_id: i64, token: &str) -> Result<()>;

    async fn create(&self, email: &str, name: Option<&str>, password_hash: &str) -> Result<User>;
}

// =============================================================================
// INFERENCE
// =============================================================================

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Whether responses are constrained to a JSON object.
    fn json_mode(&self) -> bool {
        false
    }

    fn model_name(&self) -> &str;
}
