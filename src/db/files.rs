//! File operations.
//!
//! Each committing mutation writes the file change and the resulting snapshot
//! in the same transaction. [`Database::save_draft`] is the one exception: it
//! writes content without touching history, leaving the caller to checkpoint
//! with [`Database::commit_snapshot`] once edits settle.

use chrono::Utc;
use uuid::Uuid;

use super::snapshots::commit_in;
use super::*;

impl Database {
    // ============================================================
    // File operations
    // ============================================================

    pub fn list_files(&self, project_id: Uuid) -> VaultResult<Vec<ProjectFile>> {
        let conn = self.lock();
        Ok(load_files(&conn, project_id)?)
    }

    pub fn get_file(&self, project_id: Uuid, path: &str) -> VaultResult<Option<ProjectFile>> {
        let path = normalize_path(path)?;
        let conn = self.lock();
        Ok(load_file(&conn, project_id, &path)?)
    }

    /// Create a new file. Fails with [`VaultError::Conflict`] if the path exists.
    pub fn create_file(
        &self,
        project_id: Uuid,
        path: &str,
        content: &str,
    ) -> VaultResult<ProjectFile> {
        let path = normalize_path(path)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        require_project(&tx, project_id)?;

        if load_file(&tx, project_id, &path)?.is_some() {
            return Err(VaultError::conflict(format!("file {path} already exists")));
        }

        let now = Utc::now();
        let file = upsert_file(&tx, project_id, &path, content, now)?;
        commit_in(&tx, project_id, Some(&format!("Create {path}")), now)?;
        tx.commit()?;

        tracing::debug!(%project_id, path = %file.path, "Created file");
        Ok(file)
    }

    /// Write new content to a path, creating it if absent, and commit a snapshot.
    pub fn update_file(
        &self,
        project_id: Uuid,
        path: &str,
        content: &str,
    ) -> VaultResult<ProjectFile> {
        let path = normalize_path(path)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        require_project(&tx, project_id)?;

        let now = Utc::now();
        let file = upsert_file(&tx, project_id, &path, content, now)?;
        commit_in(&tx, project_id, Some(&format!("Update {path}")), now)?;
        tx.commit()?;

        tracing::debug!(%project_id, path = %file.path, "Updated file");
        Ok(file)
    }

    /// Write content without recording a snapshot.
    pub fn save_draft(
        &self,
        project_id: Uuid,
        path: &str,
        content: &str,
    ) -> VaultResult<ProjectFile> {
        let path = normalize_path(path)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        require_project(&tx, project_id)?;

        let now = Utc::now();
        let file = upsert_file(&tx, project_id, &path, content, now)?;
        tx.execute(
            "UPDATE projects SET updated_at = ? WHERE id = ?",
            (timestamp(now), project_id.to_string()),
        )?;
        tx.commit()?;
        Ok(file)
    }

    /// Remove a file. Absent files (or projects) are a no-op returning `false`
    /// and record no snapshot.
    pub fn delete_file(&self, project_id: Uuid, path: &str) -> VaultResult<bool> {
        let path = normalize_path(path)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let removed = tx.execute(
            "DELETE FROM files WHERE project_id = ? AND path = ?",
            (project_id.to_string(), &path),
        )?;
        if removed == 0 {
            return Ok(false);
        }

        commit_in(&tx, project_id, Some(&format!("Delete {path}")), Utc::now())?;
        tx.commit()?;

        tracing::debug!(%project_id, %path, "Deleted file");
        Ok(true)
    }

    /// Move a file to a new path, keeping its content.
    ///
    /// Fails with [`VaultError::NotFound`] if `from` is missing and with
    /// [`VaultError::Conflict`] if `to` already exists; in both cases nothing
    /// is written. If the moved file was the project's entry file, the entry
    /// follows it.
    pub fn rename_file(&self, project_id: Uuid, from: &str, to: &str) -> VaultResult<ProjectFile> {
        let from = normalize_path(from)?;
        let to = normalize_path(to)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let project = require_project(&tx, project_id)?;

        let source = load_file(&tx, project_id, &from)?
            .ok_or_else(|| VaultError::not_found(format!("file {from}")))?;
        if from == to {
            return Ok(source);
        }
        if load_file(&tx, project_id, &to)?.is_some() {
            return Err(VaultError::conflict(format!("file {to} already exists")));
        }

        let now = Utc::now();
        tx.execute(
            "DELETE FROM files WHERE project_id = ? AND path = ?",
            (project_id.to_string(), &from),
        )?;
        let file = upsert_file(&tx, project_id, &to, &source.content, now)?;
        if project.entry_file == from {
            tx.execute(
                "UPDATE projects SET entry_file = ? WHERE id = ?",
                (&to, project_id.to_string()),
            )?;
        }
        commit_in(&tx, project_id, Some(&format!("Rename {from} -> {to}")), now)?;
        tx.commit()?;

        tracing::debug!(%project_id, %from, %to, "Renamed file");
        Ok(file)
    }
}
