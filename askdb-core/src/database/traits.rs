//! Database provider trait
//!
//! This trait defines the interface that all backend implementations must
//! provide. A provider is a live, disposable handle: it is opened by
//! [`crate::database::connect`] for a single logical operation and must be
//! disposed with [`DatabaseProvider::close`] on every exit path.

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::{ExecutionResult, SchemaSnapshot};

/// Live handle to one target database.
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    /// Enumerate all tables and columns visible to the connected credential's
    /// default schema, in catalog order.
    ///
    /// Every call re-queries live metadata; the schema behind a stored
    /// project can change between requests, so nothing is cached.
    async fn describe(&self) -> Result<SchemaSnapshot>;

    /// Execute `sql` on a single acquired connection and normalize the
    /// outcome into an [`ExecutionResult`].
    ///
    /// Mutations are committed unconditionally on success; there is no
    /// dry-run or rollback path. The connection used for execution is
    /// released before this returns, regardless of outcome.
    async fn execute(&self, sql: &str) -> Result<ExecutionResult>;

    /// Cheap connectivity round-trip.
    async fn ping(&self) -> Result<()>;

    /// Dispose the underlying pool. Leaked handles accumulate against the
    /// target database's connection budget, so this must run before the
    /// surrounding request returns, success or failure.
    async fn close(&self);
}
