//! drizzle-indexes
//!
//! PostgreSQL index introspection: read a table's indexes from the system
//! catalog and describe each one as an [`IndexDescriptor`]. A descriptor is
//! either a plain column list (possibly case-insensitive through the
//! `lower(column)` idiom, possibly partial) or an opaque expression.
//!
//! ```
//! use drizzle_indexes::{MemoryCatalog, list_indexes};
//!
//! let mut catalog = MemoryCatalog::new();
//! catalog
//!     .add_index("users", "index_users_on_username", "btree (lower((username)::text))", true)
//!     .add_index("users", "index_users_on_search", "gin (to_tsvector('english'::regconfig, bio))", false);
//!
//! let listing = list_indexes(&mut catalog, "users").unwrap();
//! let username = listing.get("index_users_on_username").unwrap();
//! assert_eq!(username.columns().unwrap(), ["username"]);
//! assert!(!username.case_sensitive());
//!
//! let search = listing.get("index_users_on_search").unwrap();
//! assert!(search.columns().is_none());
//! assert_eq!(search.kind(), Some("gin"));
//! ```
//!
//! Database access lives behind the `postgres-sync` and `tokio-postgres`
//! features.

pub use drizzle_indexes_core::*;

#[cfg(any(feature = "postgres-sync", feature = "tokio-postgres"))]
pub use drizzle_indexes_postgres as postgres;

#[cfg(any(feature = "postgres-sync", feature = "tokio-postgres"))]
pub use drizzle_indexes_postgres::PostgresCredentials;

#[cfg(feature = "postgres-sync")]
pub use drizzle_indexes_postgres::PostgresCatalog;

#[cfg(feature = "tokio-postgres")]
pub use drizzle_indexes_postgres::TokioPostgresCatalog;
