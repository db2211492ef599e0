use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable capture of a project's full file set.
///
/// Snapshots are never edited. Undo and redo restore from them; only a new
/// commit after an undo discards the snapshots beyond the current index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Position in the project's history, starting at 0.
    pub order: i64,
    pub label: Option<String>,
    pub files: Vec<SnapshotFile>,
    pub created_at: DateTime<Utc>,
}

/// A file state recorded inside a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotFile {
    pub path: String,
    pub content: String,
    pub fingerprint: String,
}

/// Snapshot metadata without file contents, used for history listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotSummary {
    pub id: Uuid,
    pub order: i64,
    pub label: Option<String>,
    pub file_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&Snapshot> for SnapshotSummary {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            id: snapshot.id,
            order: snapshot.order,
            label: snapshot.label.clone(),
            file_count: snapshot.files.len(),
            created_at: snapshot.created_at,
        }
    }
}

/// Where a project currently sits in its history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryStatus {
    pub index: i64,
    /// Number of stored snapshots, including the ones ahead of `index`.
    pub total: i64,
    pub can_undo: bool,
    pub can_redo: bool,
}

/// Input for an explicit checkpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitInput {
    pub label: Option<String>,
}

/// Result of an undo or redo request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryMove {
    /// `false` when already at the boundary; nothing was changed.
    pub moved: bool,
    pub status: HistoryStatus,
}
