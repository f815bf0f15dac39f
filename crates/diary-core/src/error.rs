//! Error types for the diary backend.

use thiserror::Error;

/// Result type alias using the diary's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for diary operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (missing or malformed field)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Uniqueness conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// LLM generation or extraction failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Speech-to-text failed
    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Object store read/write/delete failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Telegram Bot API call failed or returned an unexpected payload
    #[error("Telegram error: {0}")]
    Telegram(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the wrapped database error is a unique-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("Note 7 not found".to_string());
        assert_eq!(err.to_string(), "Not found: Note 7 not found");
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("Name is required".to_string());
        assert_eq!(err.to_string(), "Invalid input: Name is required");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("Tag already exists".to_string());
        assert_eq!(err.to_string(), "Conflict: Tag already exists");
    }

    #[test]
    fn test_error_display_external_services() {
        assert_eq!(
            Error::Transcription("timeout".into()).to_string(),
            "Transcription error: timeout"
        );
        assert_eq!(
            Error::Telegram("Failed to get file path".into()).to_string(),
            "Telegram error: Failed to get file path"
        );
        assert_eq!(
            Error::Storage("disk full".into()).to_string(),
            "Storage error: disk full"
        );
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!Error::Conflict("x".into()).is_unique_violation());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_unique_violation());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
