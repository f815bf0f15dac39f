//! Service layer for logic shared by handlers.

pub mod ingestion;
pub mod notes;
pub mod telegram;

pub use ingestion::{IngestionOutcome, IngestionPipeline};
pub use telegram::{TelegramApi, TelegramClient};
