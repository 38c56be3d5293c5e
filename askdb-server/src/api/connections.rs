//! Connection testing and schema display endpoints

use askdb_core::{database, TableNode};
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::{resolve_descriptor, TargetSelector};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConnectionResponse {
    pub status: &'static str,
}

/// Handler for POST /api/connections/test
///
/// Opens a handle, performs the cheap connectivity round-trip and disposes
/// the handle again.
pub async fn test_connection_handler(
    State(state): State<AppState>,
    Json(selector): Json<TargetSelector>,
) -> Result<Json<TestConnectionResponse>, ApiError> {
    let (descriptor, _) = resolve_descriptor(&state, &selector).await?;

    let provider = database::connect(&descriptor).await?;
    let outcome = provider.ping().await;
    provider.close().await;
    outcome?;

    Ok(Json(TestConnectionResponse { status: "ok" }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaResponse {
    /// Flat text form, as fed to the model.
    pub text: String,

    /// Tree form for UI display; empty list when the database has no tables.
    pub tables: Vec<TableNode>,
}

/// Handler for POST /api/connections/schema
pub async fn schema_handler(
    State(state): State<AppState>,
    Json(selector): Json<TargetSelector>,
) -> Result<Json<SchemaResponse>, ApiError> {
    let (descriptor, _) = resolve_descriptor(&state, &selector).await?;

    let provider = database::connect(&descriptor).await?;
    let outcome = provider.describe().await;
    provider.close().await;
    let snapshot = outcome?;

    Ok(Json(SchemaResponse {
        text: snapshot.to_text(),
        tables: snapshot.tree(),
    }))
}
