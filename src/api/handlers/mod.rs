use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::archive::Archive;
use crate::db::Database;
use crate::error::VaultError;
use crate::models::*;
use crate::templates;

type ApiResult<T> = Result<T, (StatusCode, String)>;

// ============================================================
// Error Handling
// ============================================================

/// Map a store error to a response.
///
/// Caller mistakes (conflicts, missing rows, bad input) are returned as-is.
/// Anything else is logged server-side and the client only sees a generic
/// message.
fn vault_error(e: VaultError) -> (StatusCode, String) {
    match e {
        VaultError::Conflict(_) => {
            tracing::warn!("Conflict: {}", e);
            (StatusCode::CONFLICT, e.to_string())
        }
        VaultError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        VaultError::InvalidInput(_) | VaultError::Archive(_) => {
            tracing::warn!("Validation error: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        _ => {
            tracing::error!("Internal error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

fn project_not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Project not found".to_string())
}

fn limit_reached() -> (StatusCode, String) {
    (StatusCode::CONFLICT, "Project limit reached".to_string())
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Templates
// ============================================================

pub async fn list_templates() -> Json<Vec<Template>> {
    Json(templates::builtin())
}

// ============================================================
// Projects
// ============================================================

pub async fn list_projects(State(db): State<Database>) -> ApiResult<Json<Vec<Project>>> {
    db.list_projects().map(Json).map_err(vault_error)
}

pub async fn get_project(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    db.get_project(id)
        .map_err(vault_error)?
        .map(Json)
        .ok_or_else(project_not_found)
}

pub async fn create_project(
    State(db): State<Database>,
    Json(input): Json<CreateProjectInput>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let template = templates::find(&input.template).ok_or((
        StatusCode::NOT_FOUND,
        format!("Template not found: {}", input.template),
    ))?;

    db.create_project(&template, input.name.as_deref())
        .map_err(vault_error)?
        .map(|p| (StatusCode::CREATED, Json(p)))
        .ok_or_else(limit_reached)
}

pub async fn rename_project(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<RenameProjectInput>,
) -> ApiResult<Json<Project>> {
    db.rename_project(id, &input.name).map_err(vault_error)?;
    get_project(State(db), Path(id)).await
}

pub async fn delete_project(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if db.delete_project(id).map_err(vault_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(project_not_found())
    }
}

pub async fn duplicate_project(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    if db.get_project(id).map_err(vault_error)?.is_none() {
        return Err(project_not_found());
    }

    db.duplicate_project(id)
        .map_err(vault_error)?
        .map(|p| (StatusCode::CREATED, Json(p)))
        .ok_or_else(limit_reached)
}

pub async fn set_entry_file(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<SetEntryFileInput>,
) -> ApiResult<Json<Project>> {
    db.set_entry_file(id, &input.path)
        .map(Json)
        .map_err(vault_error)
}

// ============================================================
// Files
// ============================================================

pub async fn list_files(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<ProjectFile>>> {
    db.list_files(id).map(Json).map_err(vault_error)
}

pub async fn get_file(
    State(db): State<Database>,
    Path((id, path)): Path<(Uuid, String)>,
) -> ApiResult<Json<ProjectFile>> {
    db.get_file(id, &path)
        .map_err(vault_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "File not found".to_string()))
}

pub async fn create_file(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateFileInput>,
) -> ApiResult<(StatusCode, Json<ProjectFile>)> {
    db.create_file(id, &input.path, &input.content)
        .map(|f| (StatusCode::CREATED, Json(f)))
        .map_err(vault_error)
}

pub async fn update_file(
    State(db): State<Database>,
    Path((id, path)): Path<(Uuid, String)>,
    Json(input): Json<UpdateFileInput>,
) -> ApiResult<Json<ProjectFile>> {
    db.update_file(id, &path, &input.content)
        .map(Json)
        .map_err(vault_error)
}

pub async fn save_draft(
    State(db): State<Database>,
    Path((id, path)): Path<(Uuid, String)>,
    Json(input): Json<UpdateFileInput>,
) -> ApiResult<Json<ProjectFile>> {
    db.save_draft(id, &path, &input.content)
        .map(Json)
        .map_err(vault_error)
}

pub async fn delete_file(
    State(db): State<Database>,
    Path((id, path)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    if db.delete_file(id, &path).map_err(vault_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "File not found".to_string()))
    }
}

pub async fn rename_file(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<RenameFileInput>,
) -> ApiResult<Json<ProjectFile>> {
    db.rename_file(id, &input.from, &input.to)
        .map(Json)
        .map_err(vault_error)
}

// ============================================================
// History
// ============================================================

pub async fn list_snapshots(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<SnapshotSummary>>> {
    let snapshots = db.list_snapshots(id).map_err(vault_error)?;
    Ok(Json(snapshots.iter().map(Into::into).collect()))
}

pub async fn commit_snapshot(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
    Json(input): Json<CommitInput>,
) -> ApiResult<(StatusCode, Json<SnapshotSummary>)> {
    db.commit_snapshot(id, input.label.as_deref())
        .map(|s| (StatusCode::CREATED, Json(SnapshotSummary::from(&s))))
        .map_err(vault_error)
}

pub async fn get_history(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<HistoryStatus>> {
    db.history_status(id)
        .map_err(vault_error)?
        .map(Json)
        .ok_or_else(project_not_found)
}

pub async fn undo(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<HistoryMove>> {
    let moved = db.undo(id).map_err(vault_error)?;
    history_move(&db, id, moved)
}

pub async fn redo(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<HistoryMove>> {
    let moved = db.redo(id).map_err(vault_error)?;
    history_move(&db, id, moved)
}

fn history_move(db: &Database, id: Uuid, moved: bool) -> ApiResult<Json<HistoryMove>> {
    let status = db
        .history_status(id)
        .map_err(vault_error)?
        .ok_or_else(project_not_found)?;
    Ok(Json(HistoryMove { moved, status }))
}

// ============================================================
// Archives
// ============================================================

pub async fn export_project(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let archive = db
        .export_archive(id)
        .map_err(vault_error)?
        .ok_or_else(project_not_found)?;

    let disposition = format!("attachment; filename=\"{}\"", archive.file_name.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        archive.bytes,
    ))
}

/// Query parameters for importing an archive.
#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    /// Original file name, used to name the project.
    pub name: Option<String>,
}

pub async fn import_project(
    State(db): State<Database>,
    Query(query): Query<ImportQuery>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Project>)> {
    if db.count_projects().map_err(vault_error)? >= db.max_projects() {
        return Err(limit_reached());
    }

    let archive = Archive {
        file_name: query.name.unwrap_or_default(),
        bytes: body.to_vec(),
    };
    db.import_archive(&archive)
        .map_err(vault_error)?
        .map(|p| (StatusCode::CREATED, Json(p)))
        .ok_or((
            StatusCode::BAD_REQUEST,
            "Archive contains no files".to_string(),
        ))
}

// ============================================================
// Active project
// ============================================================

pub async fn get_active_project(State(db): State<Database>) -> ApiResult<Json<Project>> {
    db.active_project()
        .map_err(vault_error)?
        .map(Json)
        .ok_or_else(project_not_found)
}

pub async fn set_active_project(
    State(db): State<Database>,
    Json(input): Json<SetActiveProjectInput>,
) -> ApiResult<StatusCode> {
    db.set_active_project(input.id).map_err(vault_error)?;
    Ok(StatusCode::NO_CONTENT)
}
