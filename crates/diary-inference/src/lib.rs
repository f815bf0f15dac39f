//! # diary-inference
//!
//! AI adapters for the life diary backend.
//!
//! This crate provides:
//! - [`TranscriptionBackend`] and a Whisper-compatible HTTP implementation
//! - An OpenAI-compatible chat completion backend (see [`openai`])
//! - [`EventExtractor`], which turns a transcript into summary, category,
//!   importance and entities
//!
//! Both adapters are optional at runtime: `from_env` returns `None` when the
//! corresponding service is not configured.

pub mod extraction;
pub mod openai;
pub mod transcription;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use diary_core::{Error, GenerationBackend, Result};

pub use extraction::{parse_extraction, EventExtractor, EXTRACTION_SYSTEM_PROMPT};
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use transcription::{TranscriptionBackend, TranscriptionResult, WhisperBackend};
