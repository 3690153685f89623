//! Error types for minotor-core

use thiserror::Error;

/// Main error type for the minotor-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Document store error
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Connection lock poisoned by a panicking thread
    #[error("database connection lock poisoned")]
    LockPoisoned,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Document that cannot be stored as-is
    #[error("invalid document in collection {collection}: {message}")]
    InvalidDocument { collection: String, message: String },

    /// Identity service transport error
    #[error("auth error: {0}")]
    Auth(String),

    /// Background job failed to complete
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type alias for minotor-core
pub type Result<T> = std::result::Result<T, Error>;
