//! Driver-specific catalog readers
//!
//! Each submodule wraps one client type and implements index reading for it.

#[cfg(any(feature = "postgres-sync", feature = "tokio-postgres"))]
use drizzle_indexes_core::CatalogError;

#[cfg(feature = "postgres-sync")]
pub mod postgres_sync;

#[cfg(feature = "tokio-postgres")]
pub mod tokio_postgres;

#[cfg(feature = "postgres-sync")]
pub use self::postgres_sync::PostgresCatalog;

#[cfg(feature = "tokio-postgres")]
pub use self::tokio_postgres::TokioPostgresCatalog;

#[cfg(any(feature = "postgres-sync", feature = "tokio-postgres"))]
pub(crate) fn unavailable(error: impl std::fmt::Display) -> CatalogError {
    CatalogError::Unavailable(error.to_string())
}
