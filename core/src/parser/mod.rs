//! Index definition parser
//!
//! Turns one raw catalog definition into an [`IndexDescriptor`]. Works in
//! three named stages, each usable on its own:
//!
//! 1. [`tokenize`] cuts `<method> (<body>) [INCLUDE ...] [WHERE ...]` into its
//!    clauses. A full `CREATE INDEX ... USING ...` statement, as returned by
//!    `pg_get_indexdef`, is reduced to that short form first.
//! 2. [`classify`] decides whether the body is a plain column list (each
//!    element optionally wrapped in a lower-casing function) or an expression.
//! 3. [`IndexDefinitionParser::parse`] extracts the descriptor fields.
//!
//! # Example
//!
//! ```
//! use drizzle_indexes_core::{IndexDefinitionParser, RawIndexRow};
//!
//! let parser = IndexDefinitionParser::default();
//! let row = RawIndexRow::new("index_users_on_username", "btree (lower(username::text))", false);
//! let index = parser.parse("users", &row).unwrap();
//!
//! assert_eq!(index.columns(), Some(&["username".to_string()][..]));
//! assert!(!index.case_sensitive());
//! ```

mod combinators;
mod types;

pub use types::*;

pub(crate) use combinators::qualified_name;

use std::collections::BTreeMap;

use combinators::{
    access_method, column_name, create_prefix, is_operator_class, lowered_column, parenthesized,
    trailing_clause,
};

use crate::catalog::{IndexListing, RawIndexRow};
use crate::descriptor::{ColumnOrder, DEFAULT_ACCESS_METHOD, IndexDescriptor, IndexShape};
use crate::error::{DefinitionParseError, ParseFailure};
use crate::normalize::{has_value_list, normalize_expression, normalize_predicate};
use crate::sql_text::{split_commas, split_words};

// =============================================================================
// Options
// =============================================================================

/// Knobs for the classify and extract stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Function names recognized as the lower-casing idiom (case-insensitive).
    pub lower_functions: Vec<String>,
    /// Whether expression indexes keep the catalog's unique flag. When
    /// `false` they always report `unique == false`.
    pub trust_expression_unique: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            lower_functions: vec!["lower".to_string()],
            trust_expression_unique: true,
        }
    }
}

// =============================================================================
// Stage 1: tokenize
// =============================================================================

/// Cut a raw definition into access method, body elements and trailing
/// clauses.
pub fn tokenize(definition: &str) -> Result<TokenizedDefinition<'_>, ParseFailure> {
    let text = definition.trim();
    if text.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let short = if text
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("CREATE"))
    {
        create_prefix(text)
            .map(|(rest, ())| rest.trim_start())
            .map_err(|_| ParseFailure::MissingUsing)?
    } else {
        text
    };

    let (rest, method) = access_method(short).map_err(|_| ParseFailure::MissingAccessMethod)?;
    let rest = rest.trim_start();
    if !rest.starts_with('(') {
        return Err(ParseFailure::MissingBody);
    }
    let (mut rest, body) = parenthesized(rest).map_err(|_| ParseFailure::UnbalancedBody)?;
    if body.trim().is_empty() {
        return Err(ParseFailure::EmptyBody);
    }

    let elements = split_commas(body);
    if let Some(position) = elements.iter().position(|e| e.is_empty()) {
        return Err(ParseFailure::EmptyElement(position + 1));
    }

    let mut head = format!("{method} ({body})");
    let mut include = Vec::new();
    let mut predicate = None;

    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        let (next, clause) = trailing_clause(trimmed)
            .map_err(|_| ParseFailure::TrailingInput(trimmed.to_string()))?;
        match clause {
            Clause::Include(columns) => {
                include = split_commas(columns);
                head.push_str(&format!(" INCLUDE ({columns})"));
            }
            Clause::Where(text) => {
                if !text.is_empty() && !text.starts_with(char::is_whitespace) {
                    return Err(ParseFailure::TrailingInput(trimmed.to_string()));
                }
                let text = text.trim();
                if text.is_empty() {
                    return Err(ParseFailure::EmptyPredicate);
                }
                predicate = Some(text);
            }
            // Storage parameters never change what the index is built over.
            Clause::With | Clause::Tablespace | Clause::NullsNotDistinct => {}
        }
        rest = next;
    }

    Ok(TokenizedDefinition {
        head,
        method,
        elements,
        include,
        predicate,
    })
}

// =============================================================================
// Stage 2: classify
// =============================================================================

/// Classify one body element.
pub fn classify_element(element: &str, options: &ParserOptions) -> IndexElement {
    let expression = || IndexElement::Expression(element.to_string());
    let mut words = split_words(element);

    let mut nulls_first = None;
    if words.len() >= 3 && words[words.len() - 2].eq_ignore_ascii_case("NULLS") {
        let last = words[words.len() - 1];
        nulls_first = if last.eq_ignore_ascii_case("FIRST") {
            Some(true)
        } else if last.eq_ignore_ascii_case("LAST") {
            Some(false)
        } else {
            return expression();
        };
        words.truncate(words.len() - 2);
    }

    let mut descending = false;
    if words.len() >= 2 {
        let last = words[words.len() - 1];
        if last.eq_ignore_ascii_case("DESC") {
            descending = true;
            words.pop();
        } else if last.eq_ignore_ascii_case("ASC") {
            words.pop();
        }
    }

    let (core, operator_class) = match words.as_slice() {
        [core] => (*core, None),
        [core, opclass] if is_operator_class(opclass) => (*core, Some(opclass.to_string())),
        _ => return expression(),
    };

    let (name, lowered_with) = if let Some(name) = column_name(core) {
        (name, None)
    } else if let Some((function, name)) = options.lower_functions.iter().find_map(|function| {
        lowered_column(function, core).map(|name| (function.clone(), name))
    }) {
        (name, Some(function))
    } else {
        return expression();
    };

    let order = (descending || nulls_first.is_some()).then_some(ColumnOrder {
        descending,
        nulls_first,
    });

    IndexElement::Column(ColumnElement {
        name,
        lowered_with,
        operator_class,
        order,
    })
}

/// Decide between a simple column index and an expression index.
///
/// The body is a simple index when every element is a column reference.
/// Case-insensitive when all of them are lowered, mixed wrapping counts as
/// case-sensitive. A fully lowered body restricted by a value-list predicate
/// is treated as an expression index.
pub fn classify(tokens: &TokenizedDefinition<'_>, options: &ParserOptions) -> Classification {
    let mut columns = Vec::with_capacity(tokens.elements.len());
    for element in &tokens.elements {
        match classify_element(element, options) {
            IndexElement::Column(column) => columns.push(column),
            IndexElement::Expression(_) => return Classification::Expression,
        }
    }

    let all_lowered = columns.iter().all(|c| c.lowered_with.is_some());
    if all_lowered && tokens.predicate.is_some_and(has_value_list) {
        return Classification::Expression;
    }

    Classification::Simple {
        columns,
        case_sensitive: !all_lowered,
    }
}

// =============================================================================
// Stage 3: extract
// =============================================================================

/// Parser for raw index definitions.
#[derive(Debug, Clone, Default)]
pub struct IndexDefinitionParser {
    options: ParserOptions,
}

impl IndexDefinitionParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse one catalog row of `table` into a descriptor.
    pub fn parse(
        &self,
        table: &str,
        row: &RawIndexRow,
    ) -> Result<IndexDescriptor, DefinitionParseError> {
        let tokens = tokenize(&row.definition).map_err(|reason| DefinitionParseError {
            table: table.to_string(),
            index: row.name.clone(),
            definition: row.definition.clone(),
            reason,
        })?;

        let method = tokens.method.to_ascii_lowercase();
        let kind = (method != DEFAULT_ACCESS_METHOD).then_some(method);

        let descriptor = match classify(&tokens, &self.options) {
            Classification::Simple {
                columns,
                case_sensitive,
            } => {
                let mut orders = BTreeMap::new();
                let mut operator_classes = BTreeMap::new();
                let mut lowered_with = BTreeMap::new();
                for column in &columns {
                    if let Some(function) = &column.lowered_with {
                        lowered_with.insert(column.name.clone(), function.clone());
                    }
                    if let Some(order) = column.order {
                        orders.insert(column.name.clone(), order);
                    }
                    if let Some(opclass) = &column.operator_class {
                        operator_classes.insert(column.name.clone(), opclass.clone());
                    }
                }
                let include = tokens
                    .include
                    .iter()
                    .map(|c| column_name(c).unwrap_or_else(|| c.to_string()))
                    .collect();

                IndexDescriptor {
                    name: row.name.clone(),
                    table: table.to_string(),
                    shape: IndexShape::Columns {
                        columns: columns.into_iter().map(|c| c.name).collect(),
                        conditions: tokens.predicate.map(normalize_predicate),
                    },
                    unique: row.reported_unique,
                    case_sensitive,
                    kind,
                    orders,
                    operator_classes,
                    lowered_with,
                    include,
                }
            }
            Classification::Expression => {
                let mut expression = normalize_expression(&tokens.head);
                if let Some(predicate) = tokens.predicate {
                    expression.push_str(" WHERE ");
                    expression.push_str(&normalize_predicate(predicate));
                }

                IndexDescriptor {
                    name: row.name.clone(),
                    table: table.to_string(),
                    shape: IndexShape::Expression { expression },
                    unique: row.reported_unique && self.options.trust_expression_unique,
                    case_sensitive: true,
                    kind,
                    orders: BTreeMap::new(),
                    operator_classes: BTreeMap::new(),
                    lowered_with: BTreeMap::new(),
                    include: Vec::new(),
                }
            }
        };

        Ok(descriptor)
    }

    /// Parse every row of one catalog read. Rows that fail are collected
    /// next to the successful descriptors; catalog order is preserved.
    pub fn parse_batch(
        &self,
        table: &str,
        rows: impl IntoIterator<Item = RawIndexRow>,
    ) -> IndexListing {
        let mut listing = IndexListing::new(table);
        for row in rows {
            match self.parse(table, &row) {
                Ok(descriptor) => listing.descriptors.push(descriptor),
                Err(error) => {
                    crate::index_trace_failure!(&error);
                    listing.failures.push(error);
                }
            }
        }
        listing
    }
}

/// Parse one row with default options.
pub fn parse_index(table: &str, row: &RawIndexRow) -> Result<IndexDescriptor, DefinitionParseError> {
    IndexDefinitionParser::default().parse(table, row)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(definition: &str, unique: bool) -> IndexDescriptor {
        parse_index("users", &RawIndexRow::new("idx", definition, unique)).unwrap()
    }

    fn failure(definition: &str) -> ParseFailure {
        parse_index("users", &RawIndexRow::new("idx", definition, false))
            .unwrap_err()
            .reason
    }

    #[test]
    fn test_tokenize_short_form() {
        let tokens = tokenize("btree (username) WHERE state::text = 'active'::text").unwrap();
        assert_eq!(tokens.method, "btree");
        assert_eq!(tokens.elements, vec!["username"]);
        assert_eq!(tokens.head, "btree (username)");
        assert_eq!(tokens.predicate, Some("state::text = 'active'::text"));
    }

    #[test]
    fn test_tokenize_full_statement() {
        let tokens = tokenize(
            "CREATE UNIQUE INDEX idx ON public.users USING btree (a, b DESC) INCLUDE (c) WHERE (d IS NULL)",
        )
        .unwrap();
        assert_eq!(tokens.method, "btree");
        assert_eq!(tokens.elements, vec!["a", "b DESC"]);
        assert_eq!(tokens.include, vec!["c"]);
        assert_eq!(tokens.head, "btree (a, b DESC) INCLUDE (c)");
        assert_eq!(tokens.predicate, Some("(d IS NULL)"));
    }

    #[test]
    fn test_tokenize_skips_storage_clauses() {
        let tokens =
            tokenize("btree (a) WITH (fillfactor='70') TABLESPACE fast NULLS NOT DISTINCT").unwrap();
        assert_eq!(tokens.elements, vec!["a"]);
        assert_eq!(tokens.head, "btree (a)");
        assert_eq!(tokens.predicate, None);
    }

    #[test]
    fn test_classify_element_modifiers() {
        let options = ParserOptions::default();
        assert_eq!(
            classify_element("name text_pattern_ops DESC NULLS LAST", &options),
            IndexElement::Column(ColumnElement {
                name: "name".into(),
                lowered_with: None,
                operator_class: Some("text_pattern_ops".into()),
                order: Some(ColumnOrder {
                    descending: true,
                    nulls_first: Some(false),
                }),
            })
        );
        assert_eq!(
            classify_element("name ASC", &options),
            IndexElement::Column(ColumnElement {
                name: "name".into(),
                lowered_with: None,
                operator_class: None,
                order: None,
            })
        );
        assert_eq!(
            classify_element("name COLLATE \"C\"", &options),
            IndexElement::Expression("name COLLATE \"C\"".into())
        );
    }

    #[test]
    fn test_simple_index() {
        let index = parse("btree (username)", false);
        assert_eq!(index.name(), "idx");
        assert_eq!(index.table(), "users");
        assert_eq!(index.columns(), Some(&["username".to_string()][..]));
        assert!(!index.unique());
        assert!(index.case_sensitive());
        assert_eq!(index.conditions(), None);
        assert_eq!(index.expression(), None);
        assert_eq!(index.kind(), None);
    }

    #[test]
    fn test_unique_flag_passes_through() {
        let index = parse("btree (username)", true);
        assert!(index.unique());
        assert!(index.case_sensitive());
    }

    #[test]
    fn test_case_insensitive_index() {
        let index = parse("btree (lower(username::text))", false);
        assert_eq!(index.columns(), Some(&["username".to_string()][..]));
        assert!(!index.case_sensitive());
        assert_eq!(index.expression(), None);
    }

    #[test]
    fn test_mixed_wrapping_is_case_sensitive() {
        let index = parse("btree (lower((email)::text), tenant_id)", false);
        assert_eq!(
            index.columns(),
            Some(&["email".to_string(), "tenant_id".to_string()][..])
        );
        assert!(index.case_sensitive());
    }

    #[test]
    fn test_multi_column_case_insensitive() {
        let index = parse("btree (lower(first_name), lower(last_name))", false);
        assert_eq!(
            index.columns(),
            Some(&["first_name".to_string(), "last_name".to_string()][..])
        );
        assert!(!index.case_sensitive());
    }

    #[test]
    fn test_partial_index() {
        let index = parse("btree (username) WHERE state::text = 'active'::text", false);
        assert_eq!(index.columns(), Some(&["username".to_string()][..]));
        assert_eq!(index.conditions(), Some("state::text = 'active'::text"));
        assert_eq!(index.expression(), None);
    }

    #[test]
    fn test_partial_value_list_on_plain_column() {
        let index = parse(
            "btree (username) WHERE ((state)::text = ANY ((ARRAY['active'::character varying, 'pending'::character varying])::text[]))",
            false,
        );
        assert_eq!(index.columns(), Some(&["username".to_string()][..]));
        assert_eq!(
            index.conditions(),
            Some(
                "state::text = ANY ((ARRAY['active'::character varying, 'pending'::character varying])::text[])"
            )
        );
    }

    #[test]
    fn test_expression_index() {
        let index = parse(
            "gin (to_tsvector('english'::regconfig, username::text))",
            false,
        );
        assert_eq!(index.columns(), None);
        assert_eq!(
            index.expression(),
            Some("gin (to_tsvector('english'::regconfig, username::text))")
        );
        assert_eq!(index.conditions(), None);
        assert!(!index.unique());
        assert!(index.case_sensitive());
        assert_eq!(index.kind(), Some("gin"));
    }

    #[test]
    fn test_lowered_with_value_list_folds_to_expression() {
        let definition = "btree (lower(username::text)) WHERE state::text = ANY (ARRAY['active'::text, 'pending'::text])";
        let index = parse(definition, false);
        assert_eq!(index.columns(), None);
        assert_eq!(index.conditions(), None);
        assert_eq!(index.expression(), Some(definition));
        assert!(!index.unique());
        assert!(index.case_sensitive());
    }

    #[test]
    fn test_expression_unique_policy() {
        let row = RawIndexRow::new("idx", "btree ((a + b))", true);
        assert!(parse_index("t", &row).unwrap().unique());

        let strict = IndexDefinitionParser::new(ParserOptions {
            trust_expression_unique: false,
            ..ParserOptions::default()
        });
        assert!(!strict.parse("t", &row).unwrap().unique());

        let simple = RawIndexRow::new("idx", "btree (a)", true);
        assert!(strict.parse("t", &simple).unwrap().unique());
    }

    #[test]
    fn test_custom_lower_function() {
        let parser = IndexDefinitionParser::new(ParserOptions {
            lower_functions: vec!["lower".into(), "unaccent_lower".into()],
            ..ParserOptions::default()
        });
        let row = RawIndexRow::new("idx", "btree (unaccent_lower(name))", false);
        let index = parser.parse("t", &row).unwrap();
        assert_eq!(index.columns(), Some(&["name".to_string()][..]));
        assert!(!index.case_sensitive());
    }

    #[test]
    fn test_custom_lower_function_survives_reconstruction() {
        let parser = IndexDefinitionParser::new(ParserOptions {
            lower_functions: vec!["f_lower".into()],
            ..ParserOptions::default()
        });
        let first = parser
            .parse("t", &RawIndexRow::new("idx", "btree (f_lower(email))", false))
            .unwrap();
        assert_eq!(first.lowered_with().get("email").map(String::as_str), Some("f_lower"));

        let rebuilt = first.to_definition();
        assert_eq!(rebuilt, "btree (f_lower(email))");

        let second = parser
            .parse("t", &RawIndexRow::new("idx", rebuilt.as_str(), false))
            .unwrap();
        assert_eq!(second.columns(), Some(&["email".to_string()][..]));
        assert!(!second.case_sensitive());
        assert_eq!(second.expression(), None);
    }

    #[test]
    fn test_storage_clauses_stay_out_of_expression_text() {
        let index = parse(
            "CREATE INDEX i ON public.t USING btree ((a + b)) INCLUDE (c) NULLS NOT DISTINCT WITH (fillfactor='70') TABLESPACE fast WHERE (d > 1)",
            false,
        );
        assert_eq!(
            index.expression(),
            Some("btree ((a + b)) INCLUDE (c) WHERE d > 1")
        );

        let plain = parse("btree ((a + b)) WITH (fillfactor='70')", false);
        assert_eq!(plain.expression(), Some("btree ((a + b))"));
    }

    #[test]
    fn test_lowered_with_not_in_list_folds_to_expression() {
        let index = parse(
            "btree (lower((username)::text)) WHERE ((state)::text <> ALL ((ARRAY['a'::character varying, 'b'::character varying])::text[]))",
            false,
        );
        assert_eq!(index.columns(), None);
        assert_eq!(
            index.expression(),
            Some(
                "btree (lower(username::text)) WHERE state::text <> ALL ((ARRAY['a'::character varying, 'b'::character varying])::text[])"
            )
        );
    }

    #[test]
    fn test_orders_operator_classes_and_include() {
        let index = parse(
            "btree (created_at DESC, \"Name\" text_pattern_ops) INCLUDE (id, \"Total\")",
            false,
        );
        assert_eq!(
            index.columns(),
            Some(&["created_at".to_string(), "Name".to_string()][..])
        );
        assert_eq!(
            index.orders().get("created_at"),
            Some(&ColumnOrder {
                descending: true,
                nulls_first: None
            })
        );
        assert_eq!(
            index.operator_classes().get("Name").map(String::as_str),
            Some("text_pattern_ops")
        );
        assert_eq!(index.include(), &["id".to_string(), "Total".to_string()][..]);
    }

    #[test]
    fn test_expression_keeps_predicate_in_text() {
        let index = parse("btree ((a + b)) WHERE ((c)::text = 'x'::text)", false);
        assert_eq!(
            index.expression(),
            Some("btree ((a + b)) WHERE c::text = 'x'::text")
        );
        assert_eq!(index.conditions(), None);
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(failure(""), ParseFailure::Empty);
        assert_eq!(failure("(username)"), ParseFailure::MissingAccessMethod);
        assert_eq!(failure("btree username"), ParseFailure::MissingBody);
        assert_eq!(failure("btree (lower(username)"), ParseFailure::UnbalancedBody);
        assert_eq!(failure("btree ()"), ParseFailure::EmptyBody);
        assert_eq!(failure("btree (a, , b)"), ParseFailure::EmptyElement(2));
        assert_eq!(failure("btree (a) WHERE"), ParseFailure::EmptyPredicate);
        assert_eq!(
            failure("btree (a) ORDER BY a"),
            ParseFailure::TrailingInput("ORDER BY a".into())
        );
        assert_eq!(
            failure("CREATE INDEX idx ON users (a)"),
            ParseFailure::MissingUsing
        );
    }

    #[test]
    fn test_parse_error_identifies_index() {
        let err = parse_index("users", &RawIndexRow::new("broken", "btree (", false)).unwrap_err();
        assert_eq!(err.table, "users");
        assert_eq!(err.index, "broken");
        assert_eq!(err.definition, "btree (");
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_parse_batch_keeps_order_and_failures() {
        let parser = IndexDefinitionParser::default();
        let listing = parser.parse_batch(
            "users",
            vec![
                RawIndexRow::new("a_idx", "btree (a)", false),
                RawIndexRow::new("b_idx", "btree (", false),
                RawIndexRow::new("c_idx", "hash (c)", false),
            ],
        );
        let names: Vec<&str> = listing.descriptors().iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["a_idx", "c_idx"]);
        assert_eq!(listing.failures().len(), 1);
        assert_eq!(listing.failures()[0].index, "b_idx");
    }
}
