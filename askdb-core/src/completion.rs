//! Remote chat-completion transport
//!
//! Owns transport only: the full ordered conversation goes out as one
//! non-streamed request, the raw reply text comes back. Prompt semantics live
//! in [`crate::prompt`]. No retries and no timeout policy beyond the
//! transport default; a hung endpoint blocks the calling request.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::prompt::ChatTurn;

/// Connection settings for the completion endpoint, constructed once at
/// startup and passed in rather than re-read per call.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    /// Base URL of the endpoint, e.g. `http://localhost:11434`.
    pub base_url: String,

    /// Model identifier to request.
    pub model: String,

    /// Optional basic-auth credential pair.
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Client for the remote `/api/chat` endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Send the conversation and return the model's raw reply text.
    pub async fn complete(&self, conversation: &[ChatTurn]) -> Result<String> {
        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        let mut request = self.http.post(&url).json(&ChatRequest {
            model: &self.config.model,
            messages: conversation,
            stream: false,
        });
        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Completion(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Completion(format!(
                "completion endpoint returned {status}"
            )));
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| Error::Completion(format!("malformed completion reply: {e}")))?;
        Ok(reply.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::Role;

    #[test]
    fn request_payload_shape() {
        let turns = vec![ChatTurn::system("s"), ChatTurn::user("q")];
        let request = ChatRequest {
            model: "sqlcoder",
            messages: &turns,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "sqlcoder");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "q");
    }

    #[test]
    fn reply_parsing_reads_message_content() {
        let reply: ChatReply = serde_json::from_str(
            r#"{"model":"sqlcoder","message":{"role":"assistant","content":"SELECT 1;"},"done":true}"#,
        )
        .unwrap();
        assert_eq!(reply.message.content, "SELECT 1;");
    }

    #[test]
    fn turns_round_trip_through_json() {
        let turn = ChatTurn {
            role: Role::User,
            content: "hello".to_string(),
        };
        let json = serde_json::to_string(&turn).unwrap();
        let back: ChatTurn = serde_json::from_str(&json).unwrap();
        assert_eq!(back, turn);
    }
}
