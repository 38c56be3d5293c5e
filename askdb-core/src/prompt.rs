//! Conversation assembly for the completion endpoint
//!
//! Builds the ordered message sequence sent to the model: one system turn
//! carrying the dialect, the schema text and the rule block, then the prior
//! turns in their given order, then the new question.

use serde::{Deserialize, Serialize};

/// Role of one conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Build the conversation for one question.
///
/// The turn sequence is always `[system, history..., user(question)]`. History
/// turns keep their given order and roles; nothing is reordered or
/// deduplicated, even if the history repeats a question verbatim.
pub fn build_conversation(
    question: &str,
    schema_text: &str,
    dialect: &str,
    history: &[ChatTurn],
) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(history.len() + 2);
    turns.push(ChatTurn::system(system_prompt(schema_text, dialect)));
    turns.extend_from_slice(history);
    turns.push(ChatTurn::user(question));
    turns
}

fn system_prompt(schema_text: &str, dialect: &str) -> String {
    format!(
        "You are an expert SQL assistant for the {dialect} dialect.\n\
         Your task is to turn the user's question into a valid SQL statement.\n\
         \n\
         Database schema:\n\
         {schema_text}\n\
         \n\
         Rules:\n\
         1. Return only the SQL statement, nothing else.\n\
         2. Never wrap the SQL in markdown or code-fence markers.\n\
         3. Never add explanations.\n\
         4. If the question asks for inserting, updating, deleting or creating tables, generate that statement.\n\
         5. Use only the tables and columns present in the schema above, unless the question explicitly asks to create new ones.\n\
         6. Never generate CREATE DATABASE or USE statements; the connection already targets the correct database."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_is_system_then_history_then_question() {
        let history = vec![
            ChatTurn::user("how many users?"),
            ChatTurn::assistant("SELECT COUNT(*) FROM users;"),
        ];
        let turns = build_conversation("list their emails", "Table users: [...]", "postgresql", &history);

        assert_eq!(turns.len(), history.len() + 2);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1], history[0]);
        assert_eq!(turns[2], history[1]);
        assert_eq!(turns[3], ChatTurn::user("list their emails"));
    }

    #[test]
    fn empty_history_yields_two_turns() {
        let turns = build_conversation("q", "schema", "mysql", &[]);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::System);
        assert_eq!(turns[1].role, Role::User);
    }

    #[test]
    fn system_turn_embeds_dialect_schema_and_rules() {
        let turns = build_conversation("q", "Table users: [id (INTEGER)]", "postgresql", &[]);
        let system = &turns[0].content;
        assert!(system.contains("postgresql"));
        assert!(system.contains("Table users: [id (INTEGER)]"));
        assert!(system.contains("Return only the SQL statement"));
        assert!(system.contains("CREATE DATABASE"));
    }

    #[test]
    fn repeated_history_turns_are_not_deduplicated() {
        let history = vec![ChatTurn::user("same"), ChatTurn::user("same")];
        let turns = build_conversation("q", "s", "mysql", &history);
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[1], turns[2]);
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(ChatTurn::assistant("x")).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "x");
    }
}
