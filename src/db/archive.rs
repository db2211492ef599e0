//! Import and export of projects as zip archives.

use uuid::Uuid;

use super::projects::ProjectSeed;
use super::*;
use crate::archive::{self, Archive};

impl Database {
    // ============================================================
    // Archive operations
    // ============================================================

    /// Pack a project's current files into a zip. Returns `Ok(None)` if the
    /// project does not exist.
    pub fn export_archive(&self, project_id: Uuid) -> VaultResult<Option<Archive>> {
        let (project, files) = {
            let conn = self.lock();
            let Some(project) = load_project(&conn, project_id)? else {
                return Ok(None);
            };
            (project, load_files(&conn, project_id)?)
        };

        let bytes = archive::encode(files.iter().map(|f| (f.path.as_str(), f.content.as_str())))?;
        tracing::info!(%project_id, files = files.len(), "Exported project");

        Ok(Some(Archive {
            file_name: archive::export_file_name(&project.name),
            bytes,
        }))
    }

    /// Create a new project from a zip archive.
    ///
    /// Returns `Ok(None)` if the archive holds no files or the project cap is
    /// reached. Unreadable zips are an error.
    pub fn import_archive(&self, input: &Archive) -> VaultResult<Option<Project>> {
        let entries = archive::decode(&input.bytes)?;
        if entries.is_empty() {
            tracing::warn!(file = %input.file_name, "Archive contains no files");
            return Ok(None);
        }

        let project = self.seed_project(ProjectSeed {
            name: archive::project_name(&input.file_name),
            framework: archive::detect_framework(&entries),
            entry_file: archive::detect_entry_file(&entries),
            files: entries.into_iter().map(|e| (e.path, e.content)).collect(),
            label: "Imported archive",
        })?;

        if let Some(project) = &project {
            tracing::info!(
                id = %project.id,
                framework = project.framework.as_str(),
                "Imported project {}",
                project.name
            );
        }
        Ok(project)
    }
}
