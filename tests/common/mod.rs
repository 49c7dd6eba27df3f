//! Per-scenario fixtures
//!
//! Every test builds its own table schema through one of these fixtures and
//! hands the resulting catalog to the reader explicitly.

#![allow(dead_code)]

use drizzle_indexes::{IndexListing, MemoryCatalog, list_indexes};

/// An in-memory `users` table with the indexes a scenario adds to it.
pub struct Scenario {
    catalog: MemoryCatalog,
    table: &'static str,
}

impl Scenario {
    pub fn users() -> Self {
        let mut catalog = MemoryCatalog::new();
        catalog.create_table("users");
        Self {
            catalog,
            table: "users",
        }
    }

    /// Add an index the way the server would report it.
    pub fn index(mut self, name: &str, definition: &str, unique: bool) -> Self {
        self.catalog.add_index(self.table, name, definition, unique);
        self
    }

    pub fn catalog(&mut self) -> &mut MemoryCatalog {
        &mut self.catalog
    }

    pub fn list(&mut self) -> IndexListing {
        list_indexes(&mut self.catalog, self.table).expect("scenario table exists")
    }
}

#[cfg(feature = "postgres-sync")]
pub mod live {
    use drizzle_indexes::{IndexListing, PostgresCatalog, list_indexes};

    /// A throwaway schema on the server named by `DATABASE_URL`, dropped
    /// again when the fixture goes out of scope.
    pub struct TableFixture {
        catalog: PostgresCatalog,
        schema: String,
    }

    impl TableFixture {
        /// `None` when `DATABASE_URL` is not set.
        pub fn create(scenario: &str, ddl: &[&str]) -> Option<Self> {
            let url = std::env::var("DATABASE_URL").ok()?;
            let mut client =
                postgres::Client::connect(&url, postgres::NoTls).expect("connect to DATABASE_URL");
            let schema = format!("drizzle_idx_{scenario}");
            client
                .batch_execute(&format!(
                    "DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema}; SET search_path TO {schema}"
                ))
                .expect("provision scenario schema");
            for statement in ddl {
                client.batch_execute(statement).expect("scenario DDL");
            }
            Some(Self {
                catalog: PostgresCatalog::from_client(client),
                schema,
            })
        }

        pub fn table(&self, name: &str) -> String {
            format!("{}.{}", self.schema, name)
        }

        pub fn catalog(&mut self) -> &mut PostgresCatalog {
            &mut self.catalog
        }

        pub fn list(&mut self, table: &str) -> IndexListing {
            let table = self.table(table);
            list_indexes(&mut self.catalog, &table).expect("scenario table exists")
        }
    }

    impl Drop for TableFixture {
        fn drop(&mut self) {
            let _ = self
                .catalog
                .client_mut()
                .batch_execute(&format!("DROP SCHEMA IF EXISTS {} CASCADE", self.schema));
        }
    }
}
