//! # askdb-core
//!
//! Dynamic multi-backend database access layer: point at an arbitrary
//! Postgres or MySQL database, introspect its schema, turn natural-language
//! questions into SQL through a remote completion endpoint, and execute the
//! result.
//!
//! ## Components
//!
//! - [`descriptor`] — backend kinds and connection descriptors
//! - [`database`] — connection factory and per-backend providers
//!   (schema inspection and statement execution)
//! - [`prompt`] — conversation assembly for the model
//! - [`completion`] — transport to the remote chat-completion endpoint
//! - [`extract`] — fence-stripping on raw model replies
//!
//! ## Resource model
//!
//! Handles are request-scoped: [`database::connect`] opens a fresh pool, the
//! caller runs one logical operation against it, and
//! [`DatabaseProvider::close`] disposes it on every exit path. Nothing in
//! this crate is long-lived and nothing is cached.
//!
//! ## Security Warning
//!
//! The generated SQL is executed as-is, mutations included. There is no
//! statement validation, no per-table authorization and no rollback path
//! beyond what the prompt rules ask of the model. Point this at databases
//! you are prepared to let a language model write to.
//!
//! ## Example
//!
//! ```rust,no_run
//! use askdb_core::{database, BackendKind, ConnectionDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> askdb_core::Result<()> {
//!     let descriptor = ConnectionDescriptor {
//!         backend: BackendKind::Postgres,
//!         host: "localhost".to_string(),
//!         port: 5432,
//!         username: "postgres".to_string(),
//!         password: "secret".to_string(),
//!         database: "shop".to_string(),
//!     };
//!
//!     let provider = database::connect(&descriptor).await?;
//!     let snapshot = provider.describe().await;
//!     provider.close().await;
//!     println!("{}", snapshot?.to_text());
//!     Ok(())
//! }
//! ```

// Public modules
pub mod completion;
pub mod database;
pub mod descriptor;
pub mod error;
pub mod extract;
pub mod prompt;
pub mod schema;

// Public exports
pub use completion::{CompletionClient, CompletionConfig};
pub use database::{connect, DatabaseProvider};
pub use descriptor::{BackendKind, ConnectionDescriptor};
pub use error::{Error, Result};
pub use extract::extract_sql;
pub use prompt::{build_conversation, ChatTurn, Role};
pub use schema::{ExecutionResult, SchemaColumn, SchemaSnapshot, TableNode, TableSchema};
