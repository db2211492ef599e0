//! Project lifecycle: create, duplicate, rename, delete, and the project cap.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use super::snapshots::{insert_snapshot, snapshot_files};
use super::*;

const ACTIVE_PROJECT_KEY: &str = "active_project_id";

/// Everything needed to seed a brand-new project with a single snapshot.
pub(super) struct ProjectSeed<'a> {
    pub name: String,
    pub framework: Framework,
    pub entry_file: String,
    pub files: Vec<(String, String)>,
    pub label: &'a str,
}

impl Database {
    // ============================================================
    // Project operations
    // ============================================================

    /// All projects, most recently updated first.
    pub fn list_projects(&self) -> VaultResult<Vec<Project>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY updated_at DESC, rowid DESC"
        ))?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(projects)
    }

    pub fn get_project(&self, id: Uuid) -> VaultResult<Option<Project>> {
        let conn = self.lock();
        Ok(load_project(&conn, id)?)
    }

    pub fn count_projects(&self) -> VaultResult<usize> {
        let conn = self.lock();
        Ok(count_projects_in(&conn)?)
    }

    /// Create a project from a template.
    ///
    /// Returns `Ok(None)` when the project cap is reached. A blank `name`
    /// falls back to the template's name.
    pub fn create_project(
        &self,
        template: &Template,
        name: Option<&str>,
    ) -> VaultResult<Option<Project>> {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(template.name.as_str())
            .to_string();

        let files = template
            .files
            .iter()
            .map(|(path, content)| Ok((normalize_path(path)?, content.clone())))
            .collect::<VaultResult<Vec<_>>>()?;

        let project = self.seed_project(ProjectSeed {
            name,
            framework: template.framework,
            entry_file: normalize_path(&template.entry_file)?,
            files,
            label: "Initial template",
        })?;

        if let Some(project) = &project {
            tracing::info!(
                id = %project.id,
                template = %template.id,
                "Created project {}",
                project.name
            );
        }
        Ok(project)
    }

    /// Copy a project's current files into a new project with a fresh history.
    ///
    /// Returns `Ok(None)` if the source does not exist or the cap is reached.
    /// Undo history is not carried over.
    pub fn duplicate_project(&self, id: Uuid) -> VaultResult<Option<Project>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let Some(source) = load_project(&tx, id)? else {
            return Ok(None);
        };
        let files = load_files(&tx, id)?;

        let project = seed_in(
            &tx,
            self.max_projects,
            ProjectSeed {
                name: format!("{} (copy)", source.name),
                framework: source.framework,
                entry_file: source.entry_file,
                files: files.into_iter().map(|f| (f.path, f.content)).collect(),
                label: "Duplicated project",
            },
        )?;
        tx.commit()?;

        if let Some(project) = &project {
            tracing::info!(source = %id, id = %project.id, "Duplicated project");
        }
        Ok(project)
    }

    /// Rename a project. Blank names are ignored.
    pub fn rename_project(&self, id: Uuid, name: &str) -> VaultResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(());
        }

        let conn = self.lock();
        let rows = conn.execute(
            "UPDATE projects SET name = ?, updated_at = ? WHERE id = ?",
            (name, timestamp(Utc::now()), id.to_string()),
        )?;
        if rows == 0 {
            return Err(VaultError::not_found(format!("project {id}")));
        }
        Ok(())
    }

    /// Point the project at a different entry file. The file must exist.
    pub fn set_entry_file(&self, id: Uuid, path: &str) -> VaultResult<Project> {
        let path = normalize_path(path)?;
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        require_project(&tx, id)?;
        if load_file(&tx, id, &path)?.is_none() {
            return Err(VaultError::not_found(format!("file {path}")));
        }

        tx.execute(
            "UPDATE projects SET entry_file = ?, updated_at = ? WHERE id = ?",
            (&path, timestamp(Utc::now()), id.to_string()),
        )?;
        let project = require_project(&tx, id)?;
        tx.commit()?;
        Ok(project)
    }

    /// Delete a project together with its files and snapshots.
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn delete_project(&self, id: Uuid) -> VaultResult<bool> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let id_str = id.to_string();

        tx.execute("DELETE FROM snapshots WHERE project_id = ?", [&id_str])?;
        tx.execute("DELETE FROM files WHERE project_id = ?", [&id_str])?;
        let rows = tx.execute("DELETE FROM projects WHERE id = ?", [&id_str])?;
        tx.execute(
            "DELETE FROM settings WHERE key = ? AND value = ?",
            (ACTIVE_PROJECT_KEY, &id_str),
        )?;
        tx.commit()?;

        if rows > 0 {
            tracing::info!(%id, "Deleted project");
        }
        Ok(rows > 0)
    }

    // ============================================================
    // Active project pointer
    // ============================================================

    /// Remember which project the caller last worked on.
    pub fn set_active_project(&self, id: Uuid) -> VaultResult<()> {
        let conn = self.lock();
        require_project(&conn, id)?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?, ?)
             ON CONFLICT (key) DO UPDATE SET value = excluded.value",
            (ACTIVE_PROJECT_KEY, id.to_string()),
        )?;
        Ok(())
    }

    /// The remembered project, or the most recently updated one if the
    /// pointer is unset or stale.
    pub fn active_project(&self) -> VaultResult<Option<Project>> {
        let remembered = {
            let conn = self.lock();
            let value: Option<String> = conn
                .query_row(
                    "SELECT value FROM settings WHERE key = ?",
                    [ACTIVE_PROJECT_KEY],
                    |row| row.get(0),
                )
                .optional()?;
            match value.and_then(|v| Uuid::parse_str(&v).ok()) {
                Some(id) => load_project(&conn, id)?,
                None => None,
            }
        };

        match remembered {
            Some(project) => Ok(Some(project)),
            None => Ok(self.list_projects()?.into_iter().next()),
        }
    }

    /// Insert a project, its files and its order-0 snapshot in one transaction.
    /// Returns `Ok(None)` when the cap is reached.
    pub(super) fn seed_project(&self, seed: ProjectSeed<'_>) -> VaultResult<Option<Project>> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        let project = seed_in(&tx, self.max_projects, seed)?;
        tx.commit()?;
        Ok(project)
    }
}

/// Insert a seeded project unless the cap is already reached.
fn seed_in(
    conn: &Connection,
    max_projects: usize,
    seed: ProjectSeed<'_>,
) -> VaultResult<Option<Project>> {
    let count = count_projects_in(conn)?;
    if count >= max_projects {
        tracing::warn!(count, max = max_projects, "Project limit reached");
        return Ok(None);
    }
    insert_project(conn, &seed, Utc::now()).map(Some)
}

fn insert_project(
    conn: &Connection,
    seed: &ProjectSeed<'_>,
    now: DateTime<Utc>,
) -> VaultResult<Project> {
    let project = Project {
        id: Uuid::new_v4(),
        name: seed.name.clone(),
        framework: seed.framework,
        entry_file: seed.entry_file.clone(),
        snapshot_index: 0,
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO projects (id, name, framework, entry_file, snapshot_index, created_at, updated_at)
         VALUES (?, ?, ?, ?, 0, ?, ?)",
        (
            project.id.to_string(),
            &project.name,
            project.framework.as_str(),
            &project.entry_file,
            timestamp(now),
            timestamp(now),
        ),
    )?;

    for (path, content) in &seed.files {
        upsert_file(conn, project.id, path, content, now)?;
    }
    let files = load_files(conn, project.id)?;
    insert_snapshot(conn, project.id, 0, Some(seed.label), snapshot_files(&files), now)?;

    Ok(project)
}
