//! PostgreSQL catalog readers for drizzle-indexes
//!
//! Enable `postgres-sync` for [`PostgresCatalog`] (blocking `postgres`
//! client, usable with [`drizzle_indexes_core::list_indexes`]) or
//! `tokio-postgres` for [`TokioPostgresCatalog`].
//!
//! ```rust,ignore
//! use drizzle_indexes_core::list_indexes;
//! use drizzle_indexes_postgres::{PostgresCatalog, PostgresCredentials};
//!
//! let mut catalog = PostgresCatalog::connect(&PostgresCredentials::from_url(url))?;
//! let listing = list_indexes(&mut catalog, "public.users")?;
//! for index in listing.descriptors() {
//!     println!("{}: {:?}", index.name(), index.columns());
//! }
//! ```

mod credentials;
pub mod drivers;
pub mod queries;

pub use credentials::PostgresCredentials;

#[cfg(feature = "postgres-sync")]
pub use drivers::PostgresCatalog;

#[cfg(feature = "tokio-postgres")]
pub use drivers::TokioPostgresCatalog;
