//! SQLite-backed project store.
//!
//! [`Database`] is the single entry point for reading and mutating projects,
//! files and snapshots. Every operation that touches more than one row runs
//! inside one transaction, so readers never observe a half-applied commit,
//! undo or redo.

mod archive;
mod files;
mod projects;
mod schema;
mod snapshots;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::error::{VaultError, VaultResult};
use crate::fingerprint::fingerprint;
use crate::models::*;

/// Project cap used when none is configured.
pub const DEFAULT_MAX_PROJECTS: usize = 10;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
    max_projects: usize,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "codevault")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("codevault.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            max_projects: DEFAULT_MAX_PROJECTS,
        }
    }

    /// Set the maximum number of projects the store will hold.
    pub fn with_max_projects(mut self, max_projects: usize) -> Self {
        self.max_projects = max_projects;
        self
    }

    pub fn max_projects(&self) -> usize {
        self.max_projects
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            max_projects: self.max_projects,
        }
    }
}

// ============================================================
// Row helpers shared by the store modules
// ============================================================

const PROJECT_COLUMNS: &str =
    "id, name, framework, entry_file, snapshot_index, created_at, updated_at";

const FILE_COLUMNS: &str = "project_id, path, content, fingerprint, updated_at";

const SNAPSHOT_COLUMNS: &str = "id, project_id, order_index, label, files, created_at";

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        framework: Framework::from_str(&row.get::<_, String>(2)?).unwrap_or(Framework::Vanilla),
        entry_file: row.get(3)?,
        snapshot_index: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<ProjectFile> {
    Ok(ProjectFile {
        project_id: parse_uuid(row.get::<_, String>(0)?),
        path: row.get(1)?,
        content: row.get(2)?,
        fingerprint: row.get(3)?,
        updated_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<Snapshot> {
    let files_json: String = row.get(4)?;
    let files: Vec<SnapshotFile> = serde_json::from_str(&files_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(Snapshot {
        id: parse_uuid(row.get::<_, String>(0)?),
        project_id: parse_uuid(row.get::<_, String>(1)?),
        order: row.get(2)?,
        label: row.get(3)?,
        files,
        created_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

fn load_project(conn: &Connection, id: Uuid) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"),
        [id.to_string()],
        project_from_row,
    )
    .optional()
}

fn require_project(conn: &Connection, id: Uuid) -> VaultResult<Project> {
    load_project(conn, id)?.ok_or_else(|| VaultError::not_found(format!("project {id}")))
}

fn load_files(conn: &Connection, project_id: Uuid) -> rusqlite::Result<Vec<ProjectFile>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {FILE_COLUMNS} FROM files WHERE project_id = ? ORDER BY path"
    ))?;
    let files = stmt
        .query_map([project_id.to_string()], file_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(files)
}

fn load_file(
    conn: &Connection,
    project_id: Uuid,
    path: &str,
) -> rusqlite::Result<Option<ProjectFile>> {
    conn.query_row(
        &format!("SELECT {FILE_COLUMNS} FROM files WHERE project_id = ? AND path = ?"),
        (project_id.to_string(), path),
        file_from_row,
    )
    .optional()
}

/// Insert or replace a file row, recomputing its fingerprint.
fn upsert_file(
    conn: &Connection,
    project_id: Uuid,
    path: &str,
    content: &str,
    now: DateTime<Utc>,
) -> rusqlite::Result<ProjectFile> {
    let file = ProjectFile {
        project_id,
        path: path.to_string(),
        content: content.to_string(),
        fingerprint: fingerprint(content),
        updated_at: now,
    };
    write_file_row(conn, &file)?;
    Ok(file)
}

fn write_file_row(conn: &Connection, file: &ProjectFile) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO files (project_id, path, content, fingerprint, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT (project_id, path) DO UPDATE SET
             content = excluded.content,
             fingerprint = excluded.fingerprint,
             updated_at = excluded.updated_at",
        (
            file.project_id.to_string(),
            &file.path,
            &file.content,
            &file.fingerprint,
            timestamp(file.updated_at),
        ),
    )?;
    Ok(())
}

fn count_projects_in(conn: &Connection) -> rusqlite::Result<usize> {
    conn.query_row("SELECT COUNT(*) FROM projects", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as usize)
}

/// Fixed-width RFC 3339 so that lexical order matches chronological order.
fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
