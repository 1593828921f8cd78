//! Error types for scantally-core

use thiserror::Error;

/// Result type alias using scantally-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in scantally-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Local durable storage is exhausted; the scan was not recorded
    #[error("Local storage is full: {0}")]
    StorageFull(String),
}

/// `SQLITE_FULL` primary result code.
const SQLITE_FULL: i32 = 13;

impl Error {
    /// Classify a libSQL error raised while writing to the local log.
    ///
    /// Disk exhaustion is surfaced as [`Error::StorageFull`]; everything else
    /// stays a plain libSQL error.
    pub fn from_write_failure(error: libsql::Error) -> Self {
        let is_full = match &error {
            libsql::Error::SqliteFailure(code, _) => code & 0xff == SQLITE_FULL,
            _ => false,
        } || error
            .to_string()
            .to_ascii_lowercase()
            .contains("database or disk is full");

        if is_full {
            Self::StorageFull(error.to_string())
        } else {
            Self::LibSql(error)
        }
    }

    /// Whether this error means the local store could not accept more data.
    pub const fn is_storage_full(&self) -> bool {
        matches!(self, Self::StorageFull(_))
    }
}
