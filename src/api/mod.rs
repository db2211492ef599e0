mod handlers;

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    let api = Router::new()
        // Templates
        .route("/templates", get(handlers::list_templates))
        // Projects
        .route(
            "/projects",
            get(handlers::list_projects).post(handlers::create_project),
        )
        .route(
            "/projects/{id}",
            get(handlers::get_project)
                .put(handlers::rename_project)
                .delete(handlers::delete_project),
        )
        .route("/projects/{id}/duplicate", post(handlers::duplicate_project))
        .route("/projects/{id}/entry", put(handlers::set_entry_file))
        // Files
        .route(
            "/projects/{id}/files",
            get(handlers::list_files).post(handlers::create_file),
        )
        .route(
            "/projects/{id}/files/{*path}",
            get(handlers::get_file)
                .put(handlers::update_file)
                .delete(handlers::delete_file),
        )
        .route("/projects/{id}/drafts/{*path}", put(handlers::save_draft))
        .route("/projects/{id}/rename-file", post(handlers::rename_file))
        // History
        .route(
            "/projects/{id}/snapshots",
            get(handlers::list_snapshots).post(handlers::commit_snapshot),
        )
        .route("/projects/{id}/history", get(handlers::get_history))
        .route("/projects/{id}/undo", post(handlers::undo))
        .route("/projects/{id}/redo", post(handlers::redo))
        // Archives
        .route("/projects/{id}/export", get(handlers::export_project))
        .route("/import", post(handlers::import_project))
        // Last active project
        .route(
            "/active-project",
            get(handlers::get_active_project).put(handlers::set_active_project),
        )
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(db)
}
