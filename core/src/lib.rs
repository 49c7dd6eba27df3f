//! Core of drizzle-indexes: parses PostgreSQL index definitions into
//! [`IndexDescriptor`]s.
//!
//! The pieces are:
//!
//! - [`catalog`]: raw catalog rows, the [`CatalogSource`] trait and
//!   [`list_indexes`]
//! - [`parser`]: the tokenize / classify / extract pipeline
//! - [`normalize`]: best-effort predicate and expression text normalization
//! - [`descriptor`]: the resulting metadata model

pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod normalize;
pub mod parser;
mod sql_text;
mod trace;

pub use catalog::{
    CatalogSource, IndexCatalogReader, IndexListing, MemoryCatalog, ParseErrorPolicy, RawIndexRow,
    ReaderOptions, TableRef, list_indexes,
};
pub use config::IntrospectConfig;
pub use descriptor::{ColumnOrder, IndexDescriptor, quote_identifier};
pub use error::{CatalogError, ConfigError, DefinitionParseError, IndexError, ParseFailure};
pub use normalize::{has_value_list, normalize_expression, normalize_predicate};
pub use parser::{IndexDefinitionParser, ParserOptions, parse_index};
