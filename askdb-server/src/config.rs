//! Environment-based server settings
//!
//! Read once at startup into a single [`Settings`] value that is passed
//! explicitly to the components needing it; nothing re-reads the environment
//! per call.

use std::env;

use askdb_core::CompletionConfig;

/// Runtime settings for the server process.
#[derive(Debug, Clone)]
pub struct Settings {
    /// HTTP bind address.
    pub listen_addr: String,

    /// Connection URL of the internal record store.
    pub database_url: String,

    /// Completion endpoint settings.
    pub completion: CompletionConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            listen_addr: var_or("ASKDB_LISTEN_ADDR", "127.0.0.1:8000"),
            database_url: var_or("ASKDB_DATABASE_URL", "sqlite:./askdb.db?mode=rwc"),
            completion: CompletionConfig {
                base_url: required("ASKDB_OLLAMA_URL")?,
                model: required("ASKDB_OLLAMA_MODEL")?,
                username: optional("ASKDB_OLLAMA_USER"),
                password: optional("ASKDB_OLLAMA_PASS"),
            },
        })
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    optional(name).unwrap_or_else(|| default.to_string())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}
