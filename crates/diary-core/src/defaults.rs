//! Centralized default constants for the diary backend.
//!
//! Environment variable names, field defaults, and the fixed texts used by
//! the voice-ingestion pipeline live here so that the database layer, the
//! inference adapters, and the HTTP handlers agree on them.

// =============================================================================
// SERVER
// =============================================================================

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/diary";

pub const ENV_HOST: &str = "HOST";
pub const DEFAULT_HOST: &str = "0.0.0.0";

pub const ENV_PORT: &str = "PORT";
pub const DEFAULT_PORT: u16 = 3000;

pub const ENV_ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Run pending SQL migrations at startup ("false"/"0" disables).
pub const ENV_RUN_MIGRATIONS: &str = "RUN_MIGRATIONS";

/// Maximum request body size for uploads (photos, habit voice notes).
pub const ENV_MAX_UPLOAD_BYTES: &str = "MAX_UPLOAD_BYTES";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// =============================================================================
// OBJECT STORE
// =============================================================================

pub const ENV_STORAGE_PATH: &str = "STORAGE_PATH";
pub const DEFAULT_STORAGE_PATH: &str = "./data/blobs";

/// URL prefix under which stored photos are proxied.
pub const PHOTO_URL_PREFIX: &str = "/api/photo/";

/// URL prefix under which stored audio is proxied.
pub const AUDIO_URL_PREFIX: &str = "/api/audio/";

/// Fallback content type for photos whose bytes are not recognised.
pub const DEFAULT_PHOTO_CONTENT_TYPE: &str = "image/jpeg";

/// Fallback content type for audio whose bytes are not recognised.
pub const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/ogg";

// =============================================================================
// TELEGRAM
// =============================================================================

pub const ENV_TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";

pub const ENV_TELEGRAM_API_BASE_URL: &str = "TELEGRAM_API_BASE_URL";
pub const DEFAULT_TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

/// Shared secret Telegram echoes in `X-Telegram-Bot-Api-Secret-Token`.
pub const ENV_TELEGRAM_WEBHOOK_SECRET: &str = "TELEGRAM_WEBHOOK_SECRET";

pub const TELEGRAM_TIMEOUT_SECS: u64 = 30;

/// Telegram caps messages at 4096 characters; transcripts are cut well below.
pub const TELEGRAM_REPLY_MAX_CHARS: usize = 3000;

// =============================================================================
// TRANSCRIPTION
// =============================================================================

pub const ENV_WHISPER_BASE_URL: &str = "WHISPER_BASE_URL";
pub const ENV_WHISPER_MODEL: &str = "WHISPER_MODEL";
pub const DEFAULT_WHISPER_MODEL: &str = "whisper-1";
pub const WHISPER_TIMEOUT_SECS: u64 = 300;

/// Stored on an Event when the transcription adapter fails.
pub const TRANSCRIPTION_FAILED_PLACEHOLDER: &str = "(Transcription failed)";

/// Transcripts this short or shorter are not sent to the extraction model.
pub const MIN_EXTRACTION_CHARS: usize = 5;

// =============================================================================
// GENERATION / EXTRACTION
// =============================================================================

pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_GEN_MODEL: &str = "OPENAI_GEN_MODEL";
pub const ENV_OPENAI_TIMEOUT: &str = "OPENAI_TIMEOUT";
/// Request `response_format: json_object` from the generation endpoint.
pub const ENV_OPENAI_JSON_MODE: &str = "OPENAI_JSON_MODE";

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEN_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GEN_TIMEOUT_SECS: u64 = 120;

/// Categories the extraction prompt allows for an event.
pub const EVENT_CATEGORIES: &[&str] = &[
    "Work", "Personal", "Health", "Finance", "Idea", "Shopping", "Social", "Other",
];

/// Category stored when the model omits one.
pub const DEFAULT_EVENT_CATEGORY: &str = "Other";

// =============================================================================
// ENTITY DEFAULTS
// =============================================================================

pub const DEFAULT_TAG_COLOR: &str = "#3b82f6";

pub const DEFAULT_NOTE_CATEGORY: &str = "General";

/// Categories always offered by `/api/categories`, even without notes.
pub const NOTE_CATEGORIES: &[&str] = &[
    "Health",
    "Medical",
    "Prescription",
    "Appointment",
    "Personal",
    "Family",
    "Work",
    "Financial",
    "General",
    "Other",
];

pub const DEFAULT_HABIT_FREQUENCY: &str = "daily";
pub const DEFAULT_HABIT_TARGET_COUNT: i32 = 1;
pub const DEFAULT_HABIT_ICON: &str = "✓";
pub const DEFAULT_HABIT_COLOR: &str = "#3b82f6";

/// Days considered when computing a habit streak.
pub const STREAK_LOOKBACK_DAYS: i64 = 60;

/// Default window for `/habit-stats`.
pub const DEFAULT_STATS_DAYS: i64 = 30;

// =============================================================================
// SEARCH / LISTING
// =============================================================================

pub const SEARCH_MIN_QUERY_CHARS: usize = 2;
pub const SEARCH_NOTE_LIMIT: i64 = 50;
pub const SEARCH_PEOPLE_LIMIT: i64 = 20;
pub const DEBUG_LOG_LIMIT: i64 = 50;
