//! REST API endpoints

use askdb_core::ConnectionDescriptor;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

pub mod ask;
pub mod auth;
pub mod connections;
pub mod projects;
pub mod run;

/// Create the API router with all endpoints and state attached.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(ask::ask_handler))
        .route("/run", post(run::run_handler))
        .route("/connections/test", post(connections::test_connection_handler))
        .route("/connections/schema", post(connections::schema_handler))
        .route(
            "/projects",
            get(projects::list_projects_handler).post(projects::create_project_handler),
        )
        .route("/projects/{id}", get(projects::get_project_handler))
        .route("/projects/{id}/history", get(projects::history_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/change-password", post(auth::change_password_handler))
        .with_state(state)
}

/// Target database selector shared by the ask/run/connection endpoints:
/// either an inline descriptor or a stored project id.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSelector {
    #[serde(default)]
    pub db_config: Option<ConnectionDescriptor>,
    #[serde(default)]
    pub project_id: Option<i64>,
}

/// Resolve a selector to a descriptor, returning the project id when the
/// target came from the store.
pub(crate) async fn resolve_descriptor(
    state: &AppState,
    selector: &TargetSelector,
) -> Result<(ConnectionDescriptor, Option<i64>), ApiError> {
    if let Some(config) = &selector.db_config {
        return Ok((config.clone(), None));
    }
    if let Some(project_id) = selector.project_id {
        let project = state.store.project(project_id).await?;
        return Ok((project.descriptor()?, Some(project_id)));
    }
    Err(ApiError::bad_request(
        "either dbConfig or projectId is required",
    ))
}
