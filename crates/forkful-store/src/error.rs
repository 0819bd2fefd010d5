use forkful_shared::ValidationErrors;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// A unique column already holds this value.
    #[error("Duplicate value for {0}")]
    Duplicate(&'static str),

    /// The entity failed its model rules and was not written.
    #[error("{0}")]
    Invalid(ValidationErrors),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// JSON column encoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Map "no rows" to [`StoreError::NotFound`].
pub(crate) fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}
