//! Database abstraction layer
//!
//! This module provides the connection factory plus one provider per
//! supported backend. A provider wraps a freshly created pool that lives for
//! exactly one logical operation.

pub mod traits;

mod statement;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use traits::DatabaseProvider;

use crate::descriptor::{BackendKind, ConnectionDescriptor};
use crate::error::{Error, Result};

/// Pool size for per-request handles. Handles are private to one request and
/// disposed when it finishes, so the pool stays small.
pub(crate) const MAX_CONNECTIONS: u32 = 5;

/// Open a live handle for the given descriptor.
///
/// The descriptor's backend picks the provider; a backend whose support is
/// not compiled in fails here, before any network I/O. The returned provider
/// owns its pool and must be disposed with [`DatabaseProvider::close`] when
/// the operation finishes, on success and on failure alike.
pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Box<dyn DatabaseProvider>> {
    match descriptor.backend {
        #[cfg(feature = "postgres")]
        BackendKind::Postgres => Ok(Box::new(
            postgres::PostgresProvider::connect(descriptor).await?,
        )),
        #[cfg(feature = "mysql")]
        BackendKind::MySql => Ok(Box::new(mysql::MySqlProvider::connect(descriptor).await?)),
        #[allow(unreachable_patterns)]
        other => Err(Error::Connection(format!(
            "support for the {other} backend is not compiled into this build"
        ))),
    }
}
