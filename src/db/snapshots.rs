//! Linear snapshot history with undo and redo.
//!
//! History is a single chain per project. Committing after an undo first drops
//! every snapshot beyond the current index, so the discarded future cannot be
//! redone. Undo and redo only move the index and restore files from an
//! existing snapshot; they never create or delete snapshots.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use super::*;

impl Database {
    // ============================================================
    // Snapshot operations
    // ============================================================

    /// Record the project's current files as the next snapshot.
    pub fn commit_snapshot(
        &self,
        project_id: Uuid,
        label: Option<&str>,
    ) -> VaultResult<Snapshot> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let snapshot = commit_in(&tx, project_id, label, Utc::now())?;
        tx.commit()?;
        Ok(snapshot)
    }

    /// Step back one snapshot. Returns `false` when already at the first one.
    pub fn undo(&self, project_id: Uuid) -> VaultResult<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let Some(project) = load_project(&tx, project_id)? else {
            return Ok(false);
        };
        if project.snapshot_index <= 0 {
            return Ok(false);
        }

        let restored = restore_in(&tx, project_id, project.snapshot_index - 1)?;
        tx.commit()?;
        if restored {
            tracing::debug!(%project_id, index = project.snapshot_index - 1, "Undo");
        }
        Ok(restored)
    }

    /// Step forward one snapshot. Returns `false` when there is nothing to redo.
    pub fn redo(&self, project_id: Uuid) -> VaultResult<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let Some(project) = load_project(&tx, project_id)? else {
            return Ok(false);
        };

        let restored = restore_in(&tx, project_id, project.snapshot_index + 1)?;
        tx.commit()?;
        if restored {
            tracing::debug!(%project_id, index = project.snapshot_index + 1, "Redo");
        }
        Ok(restored)
    }

    /// All snapshots of a project, oldest first.
    pub fn list_snapshots(&self, project_id: Uuid) -> VaultResult<Vec<Snapshot>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE project_id = ? ORDER BY order_index"
        ))?;
        let snapshots = stmt
            .query_map([project_id.to_string()], snapshot_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(snapshots)
    }

    pub fn get_snapshot(&self, project_id: Uuid, order: i64) -> VaultResult<Option<Snapshot>> {
        let conn = self.lock();
        Ok(load_snapshot(&conn, project_id, order)?)
    }

    pub fn history_status(&self, project_id: Uuid) -> VaultResult<Option<HistoryStatus>> {
        let conn = self.lock();
        let Some(project) = load_project(&conn, project_id)? else {
            return Ok(None);
        };
        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM snapshots WHERE project_id = ?",
            [project_id.to_string()],
            |row| row.get(0),
        )?;

        Ok(Some(HistoryStatus {
            index: project.snapshot_index,
            total,
            can_undo: project.snapshot_index > 0,
            can_redo: project.snapshot_index + 1 < total,
        }))
    }
}

/// Commit the project's current files as snapshot `snapshot_index + 1`,
/// discarding any redo branch first.
pub(super) fn commit_in(
    conn: &Connection,
    project_id: Uuid,
    label: Option<&str>,
    now: DateTime<Utc>,
) -> VaultResult<Snapshot> {
    let project = require_project(conn, project_id)?;
    let order = project.snapshot_index + 1;

    let discarded = conn.execute(
        "DELETE FROM snapshots WHERE project_id = ? AND order_index > ?",
        (project_id.to_string(), project.snapshot_index),
    )?;
    if discarded > 0 {
        tracing::debug!(%project_id, discarded, "Discarded redo branch");
    }

    let files = load_files(conn, project_id)?;
    let snapshot = insert_snapshot(conn, project_id, order, label, snapshot_files(&files), now)?;

    conn.execute(
        "UPDATE projects SET snapshot_index = ?, updated_at = ? WHERE id = ?",
        (order, timestamp(now), project_id.to_string()),
    )?;

    tracing::debug!(%project_id, order, label = label.unwrap_or(""), "Committed snapshot");
    Ok(snapshot)
}

pub(super) fn insert_snapshot(
    conn: &Connection,
    project_id: Uuid,
    order: i64,
    label: Option<&str>,
    files: Vec<SnapshotFile>,
    now: DateTime<Utc>,
) -> VaultResult<Snapshot> {
    let id = Uuid::new_v4();
    conn.execute(
        "INSERT INTO snapshots (id, project_id, order_index, label, files, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        (
            id.to_string(),
            project_id.to_string(),
            order,
            label,
            serde_json::to_string(&files)?,
            timestamp(now),
        ),
    )?;

    Ok(Snapshot {
        id,
        project_id,
        order,
        label: label.map(str::to_string),
        files,
        created_at: now,
    })
}

pub(super) fn snapshot_files(files: &[ProjectFile]) -> Vec<SnapshotFile> {
    files
        .iter()
        .map(|f| SnapshotFile {
            path: f.path.clone(),
            content: f.content.clone(),
            fingerprint: f.fingerprint.clone(),
        })
        .collect()
}

fn load_snapshot(
    conn: &Connection,
    project_id: Uuid,
    order: i64,
) -> rusqlite::Result<Option<Snapshot>> {
    conn.query_row(
        &format!(
            "SELECT {SNAPSHOT_COLUMNS} FROM snapshots WHERE project_id = ? AND order_index = ?"
        ),
        (project_id.to_string(), order),
        snapshot_from_row,
    )
    .optional()
}

/// Replace the project's whole file set with snapshot `target` and point the
/// project at it. Returns `false` without writing if the snapshot is missing.
fn restore_in(conn: &Connection, project_id: Uuid, target: i64) -> VaultResult<bool> {
    let Some(snapshot) = load_snapshot(conn, project_id, target)? else {
        return Ok(false);
    };
    let now = Utc::now();

    conn.execute(
        "DELETE FROM files WHERE project_id = ?",
        [project_id.to_string()],
    )?;
    for file in snapshot.files {
        // Content and fingerprint come from the snapshot as recorded
        write_file_row(
            conn,
            &ProjectFile {
                project_id,
                path: file.path,
                content: file.content,
                fingerprint: file.fingerprint,
                updated_at: now,
            },
        )?;
    }

    conn.execute(
        "UPDATE projects SET snapshot_index = ?, updated_at = ? WHERE id = ?",
        (target, timestamp(now), project_id.to_string()),
    )?;
    Ok(true)
}
