use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A versioned coding project.
///
/// A project owns its files and its snapshot history. Deleting a project
/// removes both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub framework: Framework,
    /// Path of the file a preview should start from.
    pub entry_file: String,
    /// Order of the snapshot the current files correspond to.
    pub snapshot_index: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The runtime flavor of a project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    React,
    Vanilla,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::React => "react",
            Self::Vanilla => "vanilla",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "react" => Some(Self::React),
            "vanilla" => Some(Self::Vanilla),
            _ => None,
        }
    }
}

/// Input for creating a project from a catalog template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    /// Template id from the catalog.
    pub template: String,
    /// Display name. Blank names fall back to the template's name.
    pub name: Option<String>,
}

/// Input for renaming a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameProjectInput {
    pub name: String,
}

/// Input for changing a project's entry file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetEntryFileInput {
    pub path: String,
}

/// Input for remembering the last active project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetActiveProjectInput {
    pub id: Uuid,
}
