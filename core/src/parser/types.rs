//! Intermediate values passed between parser stages

use crate::descriptor::ColumnOrder;

/// Output of the tokenize stage: a definition cut into its clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedDefinition<'a> {
    /// `<method> (<body>) [INCLUDE (...)]`, without storage clauses or the
    /// predicate, e.g. `gin (to_tsvector(...))`.
    pub head: String,
    pub method: &'a str,
    /// Top-level elements of the parenthesized body, trimmed.
    pub elements: Vec<&'a str>,
    pub include: Vec<&'a str>,
    pub predicate: Option<&'a str>,
}

/// A trailing clause after the index body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Clause<'a> {
    Include(&'a str),
    With,
    Tablespace,
    NullsNotDistinct,
    Where(&'a str),
}

/// One index element after the classify stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexElement {
    Column(ColumnElement),
    /// Anything that is not a (possibly lowered) column reference.
    Expression(String),
}

/// A column reference, optionally wrapped in a lower-casing function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnElement {
    pub name: String,
    /// Lower-casing function wrapping the column, as configured.
    pub lowered_with: Option<String>,
    pub operator_class: Option<String>,
    pub order: Option<ColumnOrder>,
}

/// Result of classifying every element of a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Simple {
        columns: Vec<ColumnElement>,
        case_sensitive: bool,
    },
    Expression,
}
