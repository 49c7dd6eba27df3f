//! Index descriptor model

use std::collections::BTreeMap;

use serde::Serialize;

/// Access method PostgreSQL uses when none is given.
pub const DEFAULT_ACCESS_METHOD: &str = "btree";

/// Non-default ordering of one indexed column.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOrder {
    pub descending: bool,
    /// `Some` only when `NULLS FIRST` / `NULLS LAST` was spelled out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nulls_first: Option<bool>,
}

impl ColumnOrder {
    fn to_sql(self) -> String {
        let mut sql = String::new();
        if self.descending {
            sql.push_str(" DESC");
        }
        match self.nulls_first {
            Some(true) => sql.push_str(" NULLS FIRST"),
            Some(false) => sql.push_str(" NULLS LAST"),
            None => {}
        }
        sql
    }
}

/// What the index is built over. The two variants are exclusive, so a
/// descriptor can never carry both a column list and an expression.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum IndexShape {
    Columns {
        columns: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        conditions: Option<String>,
    },
    Expression {
        expression: String,
    },
}

/// Normalized metadata for one index.
///
/// Built fresh by the parser on every catalog read and never mutated
/// afterwards. Exactly one of [`columns`](Self::columns) and
/// [`expression`](Self::expression) is `Some`.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescriptor {
    pub(crate) name: String,
    pub(crate) table: String,
    #[serde(flatten)]
    pub(crate) shape: IndexShape,
    pub(crate) unique: bool,
    pub(crate) case_sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) kind: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) orders: BTreeMap<String, ColumnOrder>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) operator_classes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) lowered_with: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) include: Vec<String>,
}

impl IndexDescriptor {
    /// Index name as reported by the catalog.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Indexed columns in key order, or `None` for an expression index.
    pub fn columns(&self) -> Option<&[String]> {
        match &self.shape {
            IndexShape::Columns { columns, .. } => Some(columns),
            IndexShape::Expression { .. } => None,
        }
    }

    /// Normalized predicate of a simple partial index.
    pub fn conditions(&self) -> Option<&str> {
        match &self.shape {
            IndexShape::Columns { conditions, .. } => conditions.as_deref(),
            IndexShape::Expression { .. } => None,
        }
    }

    /// Normalized `<method> (<body>) [WHERE ...]` text of an expression index.
    pub fn expression(&self) -> Option<&str> {
        match &self.shape {
            IndexShape::Columns { .. } => None,
            IndexShape::Expression { expression } => Some(expression),
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self.shape, IndexShape::Expression { .. })
    }

    /// For expression indexes this is whatever the catalog reported (or
    /// `false`, depending on [`ParserOptions::trust_expression_unique`]) and
    /// should not be relied upon.
    ///
    /// [`ParserOptions::trust_expression_unique`]: crate::ParserOptions::trust_expression_unique
    pub fn unique(&self) -> bool {
        self.unique
    }

    /// `false` only when every indexed column is wrapped in a lower-casing
    /// function; `true` whenever that cannot be established.
    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Access method, omitted for the default `btree`.
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    /// Columns with a non-default sort order.
    pub fn orders(&self) -> &BTreeMap<String, ColumnOrder> {
        &self.orders
    }

    pub fn operator_classes(&self) -> &BTreeMap<String, String> {
        &self.operator_classes
    }

    /// Lower-casing function wrapping each column that had one. Only all
    /// columns being wrapped makes the index case-insensitive.
    pub fn lowered_with(&self) -> &BTreeMap<String, String> {
        &self.lowered_with
    }

    /// Non-key columns from an `INCLUDE (...)` clause.
    pub fn include(&self) -> &[String] {
        &self.include
    }

    /// Rebuild a short-form definition (`<method> (<body>) [WHERE ...]`) that
    /// classifies the same way when parsed again. Not byte-identical to what
    /// the catalog returned.
    pub fn to_definition(&self) -> String {
        let (columns, conditions) = match &self.shape {
            IndexShape::Expression { expression } => return expression.clone(),
            IndexShape::Columns {
                columns,
                conditions,
            } => (columns, conditions),
        };

        let elements: Vec<String> = columns
            .iter()
            .map(|column| {
                let ident = quote_identifier(column);
                let mut element = match self.lowered_with.get(column) {
                    Some(function) => format!("{function}({ident})"),
                    None => ident,
                };
                if let Some(opclass) = self.operator_classes.get(column) {
                    element.push(' ');
                    element.push_str(opclass);
                }
                if let Some(order) = self.orders.get(column) {
                    element.push_str(&order.to_sql());
                }
                element
            })
            .collect();

        let mut sql = format!(
            "{} ({})",
            self.kind.as_deref().unwrap_or(DEFAULT_ACCESS_METHOD),
            elements.join(", ")
        );
        if !self.include.is_empty() {
            let include: Vec<String> = self.include.iter().map(|c| quote_identifier(c)).collect();
            sql.push_str(&format!(" INCLUDE ({})", include.join(", ")));
        }
        if let Some(conditions) = conditions {
            sql.push_str(" WHERE ");
            sql.push_str(conditions);
        }
        sql
    }
}

/// Quote an identifier the way PostgreSQL does when it would not survive
/// unquoted.
pub fn quote_identifier(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
