//! Project record endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::store::{HistoryEntry, NewProject, Project};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsResponse {
    pub projects: Vec<Project>,
}

/// Handler for GET /api/projects
pub async fn list_projects_handler(
    State(state): State<AppState>,
) -> Result<Json<ProjectsResponse>, ApiError> {
    let projects = state.store.projects().await?;
    Ok(Json(ProjectsResponse { projects }))
}

/// Handler for POST /api/projects
pub async fn create_project_handler(
    State(state): State<AppState>,
    Json(new): Json<NewProject>,
) -> Result<Json<Project>, ApiError> {
    // Reject unsupported backend kinds at creation time instead of at first
    // use.
    new.db_type.parse::<askdb_core::BackendKind>()?;
    let project = state.store.create_project(&new).await?;
    Ok(Json(project))
}

/// Handler for GET /api/projects/{id}
pub async fn get_project_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Project>, ApiError> {
    let project = state.store.project(id).await?;
    Ok(Json(project))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

/// Handler for GET /api/projects/{id}/history
///
/// Entries come back in ascending creation order, the same order the prompt
/// builder replays them in.
pub async fn history_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<HistoryResponse>, ApiError> {
    // Surface a 404 for an unknown project rather than an empty history.
    state.store.project(id).await?;
    let history = state.store.history(id).await?;
    Ok(Json(HistoryResponse { history }))
}
