//! Error types for vault operations.

use thiserror::Error;

/// Result type for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;

/// Errors surfaced by the store.
///
/// Running out of project slots is not an error: the creating operations
/// return `Ok(None)` so callers can show a non-fatal message.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The target path already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A project or file that the operation needs does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Empty path, empty name and similar caller mistakes.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The underlying transaction failed and was rolled back.
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VaultError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }
}
