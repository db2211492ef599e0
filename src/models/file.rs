use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VaultError, VaultResult};

/// The live content of one path inside a project.
///
/// `(project_id, path)` is unique. Files are the current state only; history
/// lives in [`Snapshot`](super::Snapshot)s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectFile {
    pub project_id: Uuid,
    pub path: String,
    pub content: String,
    /// Hex digest of `content`, see [`crate::fingerprint`].
    pub fingerprint: String,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFileInput {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

/// Input for writing new content to an existing path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFileInput {
    pub content: String,
}

/// Input for moving a file to a new path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameFileInput {
    pub from: String,
    pub to: String,
}

/// Normalize a file path the way the store keys files.
///
/// Surrounding whitespace, a leading `./` and leading `/` are dropped. Empty
/// paths, a trailing `/` and empty segments (`a//b`) are rejected: they
/// cannot round-trip through a zip archive as file entries.
pub fn normalize_path(path: &str) -> VaultResult<String> {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    let trimmed = trimmed.trim_start_matches('/');

    if trimmed.is_empty() {
        return Err(VaultError::InvalidInput("file path is empty".to_string()));
    }
    if trimmed.split('/').any(|segment| segment.is_empty()) {
        return Err(VaultError::InvalidInput(format!(
            "file path {trimmed} has an empty segment"
        )));
    }
    Ok(trimmed.to_string())
}
