//! Postgres-sync catalog reader
//!
//! Reads index rows over a blocking `postgres::Client`.

use ::postgres::{Client, IsolationLevel, NoTls, Row};
use drizzle_indexes_core::{CatalogError, CatalogSource, RawIndexRow, TableRef};

use super::unavailable;
use crate::credentials::PostgresCredentials;
use crate::queries::{INDEXES_QUERY, TABLE_EXISTS_QUERY};

/// Blocking index catalog over one PostgreSQL connection.
pub struct PostgresCatalog {
    client: Client,
}

impl PostgresCatalog {
    /// Open a new connection.
    pub fn connect(credentials: &PostgresCredentials) -> Result<Self, CatalogError> {
        let client = Client::connect(&credentials.connection_string(), NoTls).map_err(unavailable)?;
        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    pub fn into_client(self) -> Client {
        self.client
    }
}

impl std::fmt::Debug for PostgresCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresCatalog")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

impl CatalogSource for PostgresCatalog {
    fn fetch_indexes(&mut self, table: &TableRef) -> Result<Vec<RawIndexRow>, CatalogError> {
        let regclass = table.to_regclass_literal();

        // Existence check and index query share one snapshot.
        let mut tx = self
            .client
            .build_transaction()
            .isolation_level(IsolationLevel::RepeatableRead)
            .read_only(true)
            .start()
            .map_err(unavailable)?;

        let exists: bool = tx
            .query_one(TABLE_EXISTS_QUERY, &[&regclass])
            .and_then(|row| row.try_get(0))
            .map_err(unavailable)?;
        if !exists {
            return Err(CatalogError::TableNotFound(table.to_string()));
        }

        let rows = tx.query(INDEXES_QUERY, &[&regclass]).map_err(unavailable)?;
        tx.commit().map_err(unavailable)?;

        rows.iter().map(decode_row).collect()
    }
}

fn decode_row(row: &Row) -> Result<RawIndexRow, CatalogError> {
    Ok(RawIndexRow {
        name: row.try_get(0).map_err(unavailable)?,
        definition: row.try_get(1).map_err(unavailable)?,
        reported_unique: row.try_get(2).map_err(unavailable)?,
    })
}
