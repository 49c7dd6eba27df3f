//! Tokio-postgres catalog reader
//!
//! Async counterpart of [`PostgresCatalog`](super::PostgresCatalog) for
//! callers already running on tokio.

use ::tokio_postgres::{Client, IsolationLevel, NoTls, Row};
use drizzle_indexes_core::{
    CatalogError, IndexError, IndexListing, RawIndexRow, ReaderOptions, TableRef,
};

use super::unavailable;
use crate::credentials::PostgresCredentials;
use crate::queries::{INDEXES_QUERY, TABLE_EXISTS_QUERY};

/// Async index catalog over one PostgreSQL connection.
pub struct TokioPostgresCatalog {
    client: Client,
}

impl TokioPostgresCatalog {
    /// Open a new connection and drive it on a spawned tokio task.
    ///
    /// This is an async function - the caller must provide an async runtime.
    pub async fn connect(credentials: &PostgresCredentials) -> Result<Self, CatalogError> {
        let (client, connection) =
            ::tokio_postgres::connect(&credentials.connection_string(), NoTls)
                .await
                .map_err(unavailable)?;

        tokio::spawn(async move {
            if let Err(_e) = connection.await {
                #[cfg(feature = "tracing")]
                tracing::error!(error = %_e, "drizzle_indexes.connection");
            }
        });

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn into_client(self) -> Client {
        self.client
    }

    /// Raw index rows of `table`, ordered by index name.
    pub async fn fetch_indexes(
        &mut self,
        table: &TableRef,
    ) -> Result<Vec<RawIndexRow>, CatalogError> {
        let regclass = table.to_regclass_literal();

        let tx = self
            .client
            .build_transaction()
            .isolation_level(IsolationLevel::RepeatableRead)
            .read_only(true)
            .start()
            .await
            .map_err(unavailable)?;

        let exists: bool = tx
            .query_one(TABLE_EXISTS_QUERY, &[&regclass])
            .await
            .and_then(|row| row.try_get(0))
            .map_err(unavailable)?;
        if !exists {
            return Err(CatalogError::TableNotFound(table.to_string()));
        }

        let rows = tx
            .query(INDEXES_QUERY, &[&regclass])
            .await
            .map_err(unavailable)?;
        tx.commit().await.map_err(unavailable)?;

        rows.iter().map(decode_row).collect()
    }

    /// Read and parse every index of `table`, resolving the name and
    /// handling parse failures the way `options` says.
    ///
    /// ```rust,ignore
    /// let options = ReaderOptions::from_config(&IntrospectConfig::load("drizzle-indexes.toml")?);
    /// let listing = catalog.list_indexes("users", &options).await?;
    /// ```
    pub async fn list_indexes(
        &mut self,
        table: &str,
        options: &ReaderOptions,
    ) -> Result<IndexListing, IndexError> {
        let rows = self.fetch_indexes(&options.resolve(table)).await?;
        options.finish(table, rows)
    }
}

impl std::fmt::Debug for TokioPostgresCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokioPostgresCatalog")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

fn decode_row(row: &Row) -> Result<RawIndexRow, CatalogError> {
    Ok(RawIndexRow {
        name: row.try_get(0).map_err(unavailable)?,
        definition: row.try_get(1).map_err(unavailable)?,
        reported_unique: row.try_get(2).map_err(unavailable)?,
    })
}
