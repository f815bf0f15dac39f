//! # diary-core
//!
//! Core types, traits, and abstractions for the life diary backend.
//!
//! This crate provides the domain models, the shared error type and the
//! repository/adapter traits that the database, inference and API crates
//! build on.

pub mod defaults;
pub mod error;
pub mod file_safety;
pub mod habits;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use file_safety::{
    audio_url, detect_content_type, habit_voice_key, photo_key, photo_url, sanitize_filename,
    telegram_voice_key, validate_object_key,
};
pub use habits::current_streak;
pub use models::*;
pub use traits::*;
