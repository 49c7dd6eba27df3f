//! SQL text for reading the PostgreSQL index catalog

/// Resolve a table name the way `::regclass` would, returning `NULL`
/// instead of raising when the table does not exist.
///
/// `$1` is a quoted, optionally schema-qualified name as produced by
/// `TableRef::to_regclass_literal`.
pub const TABLE_EXISTS_QUERY: &str = r#"
SELECT to_regclass($1::text) IS NOT NULL AS table_exists
"#;

/// Every non-primary-key index of one table, ordered by index name.
///
/// `pg_get_indexdef` yields the full `CREATE INDEX ... USING ...` statement;
/// the parser reduces it to its `<method> (<body>) [WHERE ...]` tail.
pub const INDEXES_QUERY: &str = r#"
SELECT
    idx.relname AS name,
    pg_get_indexdef(ix.indexrelid) AS definition,
    ix.indisunique AS is_unique
FROM pg_index ix
JOIN pg_class idx ON idx.oid = ix.indexrelid
WHERE ix.indrelid = to_regclass($1::text)
  AND NOT ix.indisprimary
ORDER BY idx.relname
"#;
