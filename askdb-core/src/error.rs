//! Error taxonomy for the core access layer
//!
//! One variant per failure stage, each carrying the underlying driver or
//! transport message as detail text. The core performs no retries and no
//! silent degradation; mapping these to user-facing status codes is the
//! caller's job.

use thiserror::Error;

/// Core error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed descriptor, unreachable host, or rejected credentials.
    #[error("connection failed: {0}")]
    Connection(String),

    /// A catalog query failed during schema inspection.
    #[error("schema introspection failed: {0}")]
    Introspection(String),

    /// Transport failure or non-success reply from the completion endpoint.
    #[error("completion request failed: {0}")]
    Completion(String),

    /// The target database rejected a statement.
    #[error("query execution failed: {0}")]
    Execution(String),
}

/// Specialized Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
