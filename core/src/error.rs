//! Error types for index introspection

/// Catalog-level failures. These abort a whole `list_indexes` call and no
/// partial result is returned alongside them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("table '{0}' does not exist")]
    TableNotFound(String),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Why a single raw definition could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("definition is empty")]
    Empty,
    #[error("CREATE INDEX statement has no USING clause")]
    MissingUsing,
    #[error("expected an access method name")]
    MissingAccessMethod,
    #[error("expected a parenthesized index body after the access method")]
    MissingBody,
    #[error("unbalanced parentheses in index body")]
    UnbalancedBody,
    #[error("index body is empty")]
    EmptyBody,
    #[error("index element {0} is empty")]
    EmptyElement(usize),
    #[error("WHERE clause has no predicate")]
    EmptyPredicate,
    #[error("unexpected text `{0}`")]
    TrailingInput(String),
}

/// One index whose raw definition did not match the recognized grammar.
///
/// Scoped to that index only: the rest of the batch is still parsed. Callers
/// must treat it as "index of unknown shape", never as "no index".
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse definition of index '{index}' on '{table}': {reason} (in `{definition}`)")]
pub struct DefinitionParseError {
    pub table: String,
    pub index: String,
    pub definition: String,
    pub reason: ParseFailure,
}

/// Either failure class, for callers that escalate per-index failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Definition(#[from] DefinitionParseError),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
}
