//! SQL execution endpoint
//!
//! Runs a statement (or, for backends opened with the capability, a
//! semicolon-separated batch) against the selected target and returns the
//! normalized result. Mutations commit; there is no dry-run.

use askdb_core::{database, ExecutionResult};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::api::{resolve_descriptor, TargetSelector};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    #[serde(flatten)]
    pub target: TargetSelector,
    pub sql: String,
}

/// Handler for POST /api/run
pub async fn run_handler(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<ExecutionResult>, ApiError> {
    let (descriptor, _) = resolve_descriptor(&state, &request.target).await?;

    info!(backend = %descriptor.backend, "executing statement");
    let provider = database::connect(&descriptor).await?;
    let outcome = provider.execute(&request.sql).await;
    provider.close().await;

    Ok(Json(outcome?))
}
