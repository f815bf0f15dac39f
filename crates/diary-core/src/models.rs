//! Domain models for the diary backend.
//!
//! Row types serialize to the JSON shapes returned by the HTTP API. Composite
//! views (`NoteFull`, `PersonDetail`, ...) flatten the base row and add the
//! joined collections next to it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::defaults;

// =============================================================================
// PEOPLE
// =============================================================================

/// A person the diary tracks notes and habits for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub relationship: Option<String>,
    /// Free-text notes about the person.
    pub notes: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note linked to a person, with the person's role in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedNote {
    #[serde(flatten)]
    pub note: Note,
    pub role: Option<String>,
}

/// A person together with every note they are linked to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDetail {
    #[serde(flatten)]
    pub person: Person,
    pub linked_notes: Vec<LinkedNote>,
}

// =============================================================================
// TAGS
// =============================================================================

/// A tag definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// NOTES
// =============================================================================

/// Importance of a note or an extracted event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Importance {
    #[default]
    Low,
    Medium,
    High,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "Low",
            Importance::Medium => "Medium",
            Importance::High => "High",
        }
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Importance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Importance::Low),
            "medium" => Ok(Importance::Medium),
            "high" => Ok(Importance::High),
            other => Err(format!("Unknown importance: {}", other)),
        }
    }
}

/// A diary note row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: Option<String>,
    pub content: String,
    pub category: String,
    pub importance: Importance,
    pub event_date: Option<NaiveDate>,
    /// Ingested voice event this note was written from, if any.
    pub event_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A person attached to a note, with their role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotePerson {
    #[serde(flatten)]
    pub person: Person,
    pub role: Option<String>,
}

/// A note with its people, tags and photos.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteFull {
    #[serde(flatten)]
    pub note: Note,
    pub people: Vec<NotePerson>,
    pub tags: Vec<Tag>,
    pub photos: Vec<Photo>,
}

/// A photo attached to a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub note_id: i64,
    /// Proxy URL, `/api/photo/{key}`.
    pub photo_url: String,
    pub caption: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Photo {
    /// Object-store key of the photo blob.
    pub fn storage_key(&self) -> &str {
        self.photo_url
            .strip_prefix(defaults::PHOTO_URL_PREFIX)
            .unwrap_or(&self.photo_url)
    }
}

/// Number of notes in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

/// Result of the global search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub notes: Vec<Note>,
    pub people: Vec<Person>,
}

// =============================================================================
// HABITS
// =============================================================================

/// A habit owned by a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub person_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub frequency: String,
    pub target_count: i32,
    pub icon: String,
    pub color: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Template used to seed a person's habits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultHabit {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub color: String,
    pub sort_order: i32,
}

/// One check-in of a habit on a calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitLog {
    pub id: i64,
    pub habit_id: i64,
    pub person_id: i64,
    pub log_date: NaiveDate,
    pub completed: bool,
    pub count: i32,
    pub note: Option<String>,
    pub transcription: Option<String>,
    pub voice_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A check-in joined with its habit's display fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitLogEntry {
    #[serde(flatten)]
    pub log: HabitLog,
    pub habit_name: String,
    pub habit_icon: String,
    pub habit_color: String,
}

/// An active habit with the state of its check-in for one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitDayStatus {
    #[serde(flatten)]
    pub habit: Habit,
    pub log_id: Option<i64>,
    pub completed: Option<bool>,
    pub log_count: Option<i32>,
    pub note: Option<String>,
    pub transcription: Option<String>,
}

/// Completion counts for one habit over a window of days.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitCompletion {
    pub habit_id: i64,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub completed_count: i64,
    pub total_logs: i64,
    pub total_days: i64,
}

/// Completion counts plus the current streak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitStats {
    #[serde(flatten)]
    pub completion: HabitCompletion,
    pub current_streak: u32,
}

/// Today's habit progress for one person.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMemberSummary {
    #[serde(flatten)]
    pub person: Person,
    pub total_habits: i64,
    pub completed_habits: i64,
    pub completion_percentage: i64,
}

impl FamilyMemberSummary {
    pub fn new(person: Person, total_habits: i64, completed_habits: i64) -> Self {
        let completion_percentage = if total_habits > 0 {
            ((completed_habits as f64 / total_habits as f64) * 100.0).round() as i64
        } else {
            0
        };
        Self {
            person,
            total_habits,
            completed_habits,
            completion_percentage,
        }
    }
}

// =============================================================================
// INGESTED EVENTS
// =============================================================================

/// One ingested voice message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub telegram_file_id: Option<String>,
    pub audio_url: Option<String>,
    pub transcription: Option<String>,
    pub raw_metadata: Option<JsonValue>,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

/// A key/value pair extracted from an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub id: i64,
    pub event_id: i64,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

/// Extracted value with the transcription of its event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDataEntry {
    #[serde(flatten)]
    pub data: EventData,
    pub event_preview: Option<String>,
}

/// Structured fields extracted from a transcript, defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventExtraction {
    pub summary: String,
    pub category: String,
    pub importance: String,
    pub entities: JsonValue,
}

impl EventExtraction {
    /// Key/value rows persisted for this extraction, in insertion order.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("summary", self.summary.clone()),
            ("category", self.category.clone()),
            ("importance", self.importance.clone()),
            ("entities", self.entities.to_string()),
        ]
    }
}

/// A raw webhook payload kept for debugging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramDebugLog {
    pub id: i64,
    pub payload: String,
    pub sender: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// USERS
// =============================================================================

/// Public view of a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
}

/// A user row including the secret columns. Never serialized.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
    pub magic_link_token: Option<String>,
}
