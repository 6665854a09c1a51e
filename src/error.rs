use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, VocabError>;

/// Enum representing all possible errors in the nlvocab_rs library.
#[derive(Error, Debug)]
pub enum VocabError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Data directory not found or could not be determined")]
    DataDirNotFound,

    #[error("Catalog contains no lessons")]
    EmptyCatalog,

    #[error("Lesson not found: {0}")]
    LessonNotFound(String),

    #[error("Failed to parse data: {0}")]
    ParseError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Internal error: {0}")]
    Internal(String), // For unexpected situations
}
