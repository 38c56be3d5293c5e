//! Natural-language question endpoint
//!
//! The end-to-end flow: connect to the target, introspect its schema, build
//! the conversation, call the completion endpoint, extract bare SQL. The
//! handle opened here is closed on every exit path before the outcome is
//! propagated.

use askdb_core::{build_conversation, database, extract_sql, ChatTurn, ConnectionDescriptor, DatabaseProvider};
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{resolve_descriptor, TargetSelector};
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[serde(flatten)]
    pub target: TargetSelector,

    pub question: String,

    /// Ad-hoc history for stateless clients. Ignored when a project is
    /// given; the stored project history wins.
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskResponse {
    pub question: String,
    pub generated_sql: String,
    pub schema: String,
}

/// Handler for POST /api/ask
pub async fn ask_handler(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let (descriptor, project_id) = resolve_descriptor(&state, &request.target).await?;

    let history = match project_id {
        Some(id) => history_turns(&state, id).await?,
        None => request.history,
    };

    let provider = database::connect(&descriptor).await?;
    let outcome = generate(&state, provider.as_ref(), &descriptor, &request.question, &history).await;
    provider.close().await;
    let (schema_text, sql) = outcome?;

    if let Some(id) = project_id {
        state.store.record_history(id, &request.question, &sql).await?;
    }

    info!(sql = %sql, "generated SQL");
    Ok(Json(AskResponse {
        question: request.question,
        generated_sql: sql,
        schema: schema_text,
    }))
}

async fn generate(
    state: &AppState,
    provider: &dyn DatabaseProvider,
    descriptor: &ConnectionDescriptor,
    question: &str,
    history: &[ChatTurn],
) -> Result<(String, String), ApiError> {
    let snapshot = provider.describe().await?;
    let schema_text = snapshot.to_text();
    let conversation = build_conversation(
        question,
        &schema_text,
        descriptor.backend.dialect_name(),
        history,
    );
    let raw = state.completion.complete(&conversation).await?;
    Ok((schema_text, extract_sql(&raw)))
}

/// Normalize stored history records into chat turns at the ingress boundary:
/// each record becomes the user's question followed by the assistant's SQL.
async fn history_turns(state: &AppState, project_id: i64) -> Result<Vec<ChatTurn>, ApiError> {
    let entries = state.store.history(project_id).await?;
    let mut turns = Vec::with_capacity(entries.len() * 2);
    for entry in entries {
        turns.push(ChatTurn::user(entry.question));
        turns.push(ChatTurn::assistant(entry.generated_sql));
    }
    Ok(turns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use askdb_core::{CompletionClient, CompletionConfig, Role};
    use crate::store::Store;

    async fn test_state() -> AppState {
        AppState {
            store: Store::open("sqlite::memory:").await.unwrap(),
            completion: CompletionClient::new(CompletionConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "test".to_string(),
                username: None,
                password: None,
            }),
        }
    }

    #[tokio::test]
    async fn stored_history_becomes_alternating_turns() {
        let state = test_state().await;
        let project = state
            .store
            .create_project(&crate::store::NewProject {
                name: "p".to_string(),
                description: None,
                db_type: "postgres".to_string(),
                host: "h".to_string(),
                port: 5432,
                db_user: "u".to_string(),
                db_password: "p".to_string(),
                db_name: "d".to_string(),
            })
            .await
            .unwrap();

        state
            .store
            .record_history(project.id, "how many users?", "SELECT COUNT(*) FROM users;")
            .await
            .unwrap();

        let turns = history_turns(&state, project.id).await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[0].content, "how many users?");
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn selector_requires_a_target() {
        let state = test_state().await;
        let selector = TargetSelector {
            db_config: None,
            project_id: None,
        };
        assert!(resolve_descriptor(&state, &selector).await.is_err());
    }
}
