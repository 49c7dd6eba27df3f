//! Index catalog reading
//!
//! A [`CatalogSource`] returns the raw index rows of one table. Database
//! drivers implement it in `drizzle-indexes-postgres`; [`MemoryCatalog`]
//! implements it without a database.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::IntrospectConfig;
use crate::descriptor::IndexDescriptor;
use crate::error::{CatalogError, DefinitionParseError, IndexError};
use crate::parser::{IndexDefinitionParser, qualified_name};

// =============================================================================
// Raw Query Result Types
// =============================================================================

/// One index as reported by the system catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndexRow {
    pub name: String,
    /// `pg_get_indexdef` output, either the full `CREATE INDEX` statement or
    /// its `<method> (<body>) [WHERE ...]` tail.
    pub definition: String,
    pub reported_unique: bool,
}

impl RawIndexRow {
    pub fn new(name: impl Into<String>, definition: impl Into<String>, reported_unique: bool) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
            reported_unique,
        }
    }
}

/// Table identifier, optionally schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
        }
    }

    pub fn qualified(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            name: name.into(),
        }
    }

    /// Read `table`, `schema.table` or their double-quoted forms
    /// (`"my.schema"."my.table"`). Quoted parts are unescaped; unquoted parts
    /// are taken verbatim, without case folding. Anything else splits on the
    /// first dot.
    pub fn parse(table: &str) -> Self {
        if let Some((schema, name)) = qualified_name(table) {
            return Self { schema, name };
        }
        match table.split_once('.') {
            Some((schema, name)) => Self::qualified(schema, name),
            None => Self::new(table),
        }
    }

    /// Fill in `schema` when the reference has none.
    pub fn or_schema(mut self, schema: Option<&str>) -> Self {
        if self.schema.is_none() {
            self.schema = schema.map(str::to_string);
        }
        self
    }

    /// Quoted form suitable for `::regclass` / `to_regclass`.
    pub fn to_regclass_literal(&self) -> String {
        let quote = |s: &str| format!("\"{}\"", s.replace('"', "\"\""));
        match &self.schema {
            Some(schema) => format!("{}.{}", quote(schema), quote(&self.name)),
            None => quote(&self.name),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.name),
            None => f.write_str(&self.name),
        }
    }
}

// =============================================================================
// Sources
// =============================================================================

/// Anything that can list the raw index rows of a table.
///
/// Implementations must return rows in a stable order (by index name for the
/// PostgreSQL readers), must not mutate the catalog, and must fail with
/// [`CatalogError`] rather than return a partial list.
pub trait CatalogSource {
    fn fetch_indexes(&mut self, table: &TableRef) -> Result<Vec<RawIndexRow>, CatalogError>;
}

impl<S: CatalogSource + ?Sized> CatalogSource for &mut S {
    fn fetch_indexes(&mut self, table: &TableRef) -> Result<Vec<RawIndexRow>, CatalogError> {
        (**self).fetch_indexes(table)
    }
}

/// In-memory catalog keyed by table.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    tables: HashMap<TableRef, Vec<RawIndexRow>>,
    offline: Option<String>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&mut self, table: &str) -> &mut Self {
        self.tables.entry(TableRef::parse(table)).or_default();
        self
    }

    pub fn drop_table(&mut self, table: &str) -> &mut Self {
        self.tables.remove(&TableRef::parse(table));
        self
    }

    /// Register an index, creating the table if needed. An index with the
    /// same name on the same table is replaced.
    pub fn add_index(
        &mut self,
        table: &str,
        name: &str,
        definition: &str,
        unique: bool,
    ) -> &mut Self {
        let rows = self.tables.entry(TableRef::parse(table)).or_default();
        rows.retain(|row| row.name != name);
        rows.push(RawIndexRow::new(name, definition, unique));
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        self
    }

    /// Make every subsequent fetch fail as if the connection dropped.
    pub fn set_offline(&mut self, reason: impl Into<String>) -> &mut Self {
        self.offline = Some(reason.into());
        self
    }
}

impl CatalogSource for MemoryCatalog {
    fn fetch_indexes(&mut self, table: &TableRef) -> Result<Vec<RawIndexRow>, CatalogError> {
        if let Some(reason) = &self.offline {
            return Err(CatalogError::Unavailable(reason.clone()));
        }
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| CatalogError::TableNotFound(table.to_string()))
    }
}

// =============================================================================
// Listing
// =============================================================================

/// Descriptors of one table plus every index whose definition failed to
/// parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexListing {
    pub(crate) table: String,
    pub(crate) descriptors: Vec<IndexDescriptor>,
    pub(crate) failures: Vec<DefinitionParseError>,
}

impl IndexListing {
    pub(crate) fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            descriptors: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Successfully parsed indexes, in catalog order.
    pub fn descriptors(&self) -> &[IndexDescriptor] {
        &self.descriptors
    }

    /// Indexes of unknown shape.
    pub fn failures(&self) -> &[DefinitionParseError] {
        &self.failures
    }

    /// `true` when every index of the table was parsed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&IndexDescriptor> {
        self.descriptors.iter().find(|d| d.name() == name)
    }

    pub fn into_parts(self) -> (Vec<IndexDescriptor>, Vec<DefinitionParseError>) {
        (self.descriptors, self.failures)
    }

    /// All descriptors, or the first failure if any index was unparseable.
    pub fn into_strict(self) -> Result<Vec<IndexDescriptor>, DefinitionParseError> {
        match self.failures.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(self.descriptors),
        }
    }
}

// =============================================================================
// Reader
// =============================================================================

/// What a reader does when a definition fails to parse.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Return the parsed descriptors together with the failures.
    #[default]
    Collect,
    /// Fail the whole call with the first failure.
    Abort,
}

/// List the indexes of `table` with default parser options.
///
/// ```
/// use drizzle_indexes_core::{MemoryCatalog, list_indexes};
///
/// let mut catalog = MemoryCatalog::new();
/// catalog.add_index("users", "index_users_on_username", "btree (username)", false);
///
/// let listing = list_indexes(&mut catalog, "users").unwrap();
/// assert_eq!(listing.descriptors()[0].columns().unwrap(), ["username"]);
/// ```
pub fn list_indexes<S: CatalogSource + ?Sized>(
    source: &mut S,
    table: &str,
) -> Result<IndexListing, CatalogError> {
    let table_ref = TableRef::parse(table);
    let rows = source.fetch_indexes(&table_ref)?;
    crate::index_trace_catalog!(table, rows.len());
    Ok(IndexDefinitionParser::default().parse_batch(table, rows))
}

/// Parser, failure policy and default schema shared by every reader,
/// blocking or async.
#[derive(Debug, Clone, Default)]
pub struct ReaderOptions {
    parser: IndexDefinitionParser,
    policy: ParseErrorPolicy,
    default_schema: Option<String>,
}

impl ReaderOptions {
    /// Options taken from a loaded config.
    pub fn from_config(config: &IntrospectConfig) -> Self {
        Self {
            parser: IndexDefinitionParser::new(config.parser_options()),
            policy: config.parser.on_parse_error,
            default_schema: config.database.schema.clone(),
        }
    }

    pub fn parser(mut self, parser: IndexDefinitionParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Schema applied to unqualified table names.
    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// The catalog reference `table` resolves to.
    pub fn resolve(&self, table: &str) -> TableRef {
        TableRef::parse(table).or_schema(self.default_schema.as_deref())
    }

    /// Parse the rows fetched for `table` and apply the failure policy.
    pub fn finish(&self, table: &str, rows: Vec<RawIndexRow>) -> Result<IndexListing, IndexError> {
        crate::index_trace_catalog!(table, rows.len());

        let listing = self.parser.parse_batch(table, rows);
        if self.policy == ParseErrorPolicy::Abort
            && let Some(error) = listing.failures.first()
        {
            return Err(error.clone().into());
        }
        Ok(listing)
    }
}

/// A catalog source paired with [`ReaderOptions`].
#[derive(Debug)]
pub struct IndexCatalogReader<S> {
    source: S,
    options: ReaderOptions,
}

impl<S: CatalogSource> IndexCatalogReader<S> {
    pub fn new(source: S) -> Self {
        Self::with_options(source, ReaderOptions::default())
    }

    pub fn with_options(source: S, options: ReaderOptions) -> Self {
        Self { source, options }
    }

    /// Reader with parser options, failure policy and default schema taken
    /// from a loaded config.
    pub fn from_config(source: S, config: &IntrospectConfig) -> Self {
        Self::with_options(source, ReaderOptions::from_config(config))
    }

    pub fn parser(mut self, parser: IndexDefinitionParser) -> Self {
        self.options = self.options.parser(parser);
        self
    }

    pub fn policy(mut self, policy: ParseErrorPolicy) -> Self {
        self.options = self.options.policy(policy);
        self
    }

    pub fn default_schema(mut self, schema: impl Into<String>) -> Self {
        self.options = self.options.default_schema(schema);
        self
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Read and parse every index of `table`.
    pub fn list_indexes(&mut self, table: &str) -> Result<IndexListing, IndexError> {
        let rows = self.source.fetch_indexes(&self.options.resolve(table))?;
        self.options.finish(table, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_parse_and_display() {
        assert_eq!(TableRef::parse("users"), TableRef::new("users"));
        assert_eq!(
            TableRef::parse("app.users"),
            TableRef::qualified("app", "users")
        );
        assert_eq!(TableRef::parse("app.users").to_string(), "app.users");
    }

    #[test]
    fn test_table_ref_parse_quoted() {
        let table = TableRef::parse("\"my.schema\".\"my.table\"");
        assert_eq!(table, TableRef::qualified("my.schema", "my.table"));
        assert_eq!(table.to_regclass_literal(), "\"my.schema\".\"my.table\"");

        assert_eq!(TableRef::parse("\"my.table\""), TableRef::new("my.table"));
        assert_eq!(
            TableRef::parse("app.\"We\"\"ird\""),
            TableRef::qualified("app", "We\"ird")
        );
    }

    #[test]
    fn test_table_ref_regclass_literal() {
        assert_eq!(TableRef::new("users").to_regclass_literal(), "\"users\"");
        assert_eq!(
            TableRef::qualified("App", "we\"ird").to_regclass_literal(),
            "\"App\".\"we\"\"ird\""
        );
    }

    #[test]
    fn test_or_schema_keeps_explicit_schema() {
        assert_eq!(
            TableRef::parse("app.users").or_schema(Some("public")),
            TableRef::qualified("app", "users")
        );
        assert_eq!(
            TableRef::parse("users").or_schema(Some("public")),
            TableRef::qualified("public", "users")
        );
    }

    #[test]
    fn test_memory_catalog_orders_by_name_and_replaces() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_index("users", "b_idx", "btree (b)", false)
            .add_index("users", "a_idx", "btree (a)", false)
            .add_index("users", "b_idx", "btree (b, c)", true);

        let rows = catalog.fetch_indexes(&TableRef::new("users")).unwrap();
        assert_eq!(
            rows,
            vec![
                RawIndexRow::new("a_idx", "btree (a)", false),
                RawIndexRow::new("b_idx", "btree (b, c)", true),
            ]
        );
    }

    #[test]
    fn test_memory_catalog_missing_and_offline() {
        let mut catalog = MemoryCatalog::new();
        assert_eq!(
            catalog.fetch_indexes(&TableRef::new("ghosts")),
            Err(CatalogError::TableNotFound("ghosts".into()))
        );

        catalog.create_table("users").set_offline("connection reset");
        assert_eq!(
            catalog.fetch_indexes(&TableRef::new("users")),
            Err(CatalogError::Unavailable("connection reset".into()))
        );
    }

    #[test]
    fn test_listing_strict() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_index("users", "good", "btree (a)", false)
            .add_index("users", "bad", "btree (a", false);

        let listing = list_indexes(&mut catalog, "users").unwrap();
        assert!(!listing.is_complete());
        assert!(listing.get("good").is_some());
        assert!(listing.get("bad").is_none());
        assert_eq!(listing.into_strict().unwrap_err().index, "bad");
    }

    #[test]
    fn test_reader_policies() {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_index("public.users", "good", "btree (a)", false)
            .add_index("public.users", "bad", "btree (a", false);

        let mut collecting = IndexCatalogReader::new(&mut catalog).default_schema("public");
        let listing = collecting.list_indexes("users").unwrap();
        assert_eq!(listing.descriptors().len(), 1);
        assert_eq!(listing.failures().len(), 1);

        let mut aborting = IndexCatalogReader::new(&mut catalog)
            .default_schema("public")
            .policy(ParseErrorPolicy::Abort);
        match aborting.list_indexes("users") {
            Err(IndexError::Definition(error)) => assert_eq!(error.index, "bad"),
            other => panic!("expected a definition error, got {other:?}"),
        }
    }

    #[test]
    fn test_reader_from_config() {
        let config = IntrospectConfig::from_toml_str(
            r#"
            [database]
            schema = "app"

            [parser]
            lower_functions = ["f_lower"]
            on_parse_error = "abort"
            "#,
        )
        .unwrap();

        let mut catalog = MemoryCatalog::new();
        catalog.add_index("app.users", "idx", "btree (f_lower(email))", false);

        let mut reader = IndexCatalogReader::from_config(&mut catalog, &config);
        let listing = reader.list_indexes("users").unwrap();
        assert_eq!(listing.descriptors()[0].columns().unwrap(), ["email"]);
        assert!(!listing.descriptors()[0].case_sensitive());

        catalog.add_index("app.users", "broken", "btree (", false);
        let mut reader = IndexCatalogReader::from_config(&mut catalog, &config);
        assert!(matches!(
            reader.list_indexes("users"),
            Err(IndexError::Definition(_))
        ));
    }

    #[test]
    fn test_reader_options_from_config() {
        let config = IntrospectConfig::from_toml_str(
            "[database]\nschema = \"app\"\n\n[parser]\non_parse_error = \"abort\"",
        )
        .unwrap();
        let options = ReaderOptions::from_config(&config);

        assert_eq!(options.resolve("users"), TableRef::qualified("app", "users"));
        assert_eq!(
            options.resolve("other.users"),
            TableRef::qualified("other", "users")
        );

        let good = vec![RawIndexRow::new("a_idx", "btree (a)", false)];
        assert_eq!(options.finish("users", good).unwrap().descriptors().len(), 1);

        let bad = vec![
            RawIndexRow::new("a_idx", "btree (a)", false),
            RawIndexRow::new("b_idx", "btree (", false),
        ];
        match options.finish("users", bad.clone()) {
            Err(IndexError::Definition(error)) => assert_eq!(error.index, "b_idx"),
            other => panic!("expected a definition error, got {other:?}"),
        }

        let collecting = ReaderOptions::default();
        assert_eq!(collecting.resolve("users"), TableRef::new("users"));
        assert_eq!(collecting.finish("users", bad).unwrap().failures().len(), 1);
    }

    #[test]
    fn test_reader_surfaces_catalog_errors() {
        let mut reader = IndexCatalogReader::new(MemoryCatalog::new());
        assert_eq!(
            reader.list_indexes("users").unwrap_err(),
            IndexError::Catalog(CatalogError::TableNotFound("users".into()))
        );
    }
}
