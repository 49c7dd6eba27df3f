//! Parser combinators using nom
//!
//! Building blocks for the tokenize and classify stages.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while, take_while1},
    character::complete::{char, multispace0, multispace1, none_of},
    combinator::{all_consuming, map, opt, recognize, rest, value},
    error::{Error, ErrorKind},
    multi::fold_many0,
    sequence::{delimited, pair, preceded, terminated},
};

use super::types::Clause;
use crate::sql_text::find_closing_paren;

// =============================================================================
// Identifiers
// =============================================================================

/// Unquoted SQL identifier
pub(super) fn bare_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '$'),
    ))
    .parse(input)
}

/// Double-quoted identifier, unescaped (`"a""b"` -> `a"b`)
fn quoted_identifier(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        fold_many0(
            alt((value('"', tag("\"\"")), none_of("\""))),
            String::new,
            |mut acc, c| {
                acc.push(c);
                acc
            },
        ),
        char('"'),
    )
    .parse(input)
}

/// Quoted or unquoted identifier
pub(super) fn identifier(input: &str) -> IResult<&str, String> {
    alt((
        quoted_identifier,
        map(bare_identifier, |s: &str| s.to_string()),
    ))
    .parse(input)
}

/// Whole input is exactly one identifier.
pub(super) fn column_name(input: &str) -> Option<String> {
    all_consuming(identifier)
        .parse(input)
        .ok()
        .map(|(_, name)| name)
}

/// `name` or `schema.name`, each part quoted or not. Quoted parts are
/// unescaped; unquoted parts are taken verbatim.
pub(crate) fn qualified_name(input: &str) -> Option<(Option<String>, String)> {
    all_consuming(pair(identifier, opt(preceded(char('.'), identifier))))
        .parse(input)
        .ok()
        .map(|(_, parts)| match parts {
            (schema, Some(name)) => (Some(schema), name),
            (name, None) => (None, name),
        })
}

/// Operator class such as `text_pattern_ops` or `public.my_ops`.
pub(super) fn is_operator_class(word: &str) -> bool {
    all_consuming(recognize(pair(
        identifier,
        fold_many0(preceded(char('.'), identifier), || (), |_, _| ()),
    )))
    .parse(word)
    .is_ok()
}

// =============================================================================
// Lower-casing idiom
// =============================================================================

/// A `::type` suffix
fn cast(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        tag("::"),
        take_while1(|c: char| {
            c.is_alphanumeric() || matches!(c, '_' | ' ' | '.' | '"' | '[' | ']')
        }),
    ))
    .parse(input)
}

/// `name` or `(name)`
fn column_reference(input: &str) -> IResult<&str, String> {
    alt((
        delimited(
            pair(char('('), multispace0),
            identifier,
            pair(multispace0, char(')')),
        ),
        identifier,
    ))
    .parse(input)
}

/// `name`, `name::text`, `(name)::text` or `((name)::text)`
fn lowered_operand(input: &str) -> IResult<&str, String> {
    alt((
        terminated(column_reference, opt(cast)),
        delimited(
            pair(char('('), multispace0),
            terminated(column_reference, opt(cast)),
            pair(multispace0, char(')')),
        ),
    ))
    .parse(input)
}

/// Parse `<function>(<column>)` where the whole input is one call of the
/// lower-casing function over exactly one column. Returns the column name.
pub(super) fn lowered_column(function: &str, input: &str) -> Option<String> {
    all_consuming(delimited(
        (tag_no_case(function), multispace0, char('('), multispace0),
        lowered_operand,
        (multispace0, char(')')),
    ))
    .parse(input)
    .ok()
    .map(|(_, name)| name)
}

// =============================================================================
// Definition structure
// =============================================================================

/// Leading `CREATE ... USING ` of a full `pg_get_indexdef` statement
pub(super) fn create_prefix(input: &str) -> IResult<&str, ()> {
    value(
        (),
        (
            tag_no_case("CREATE"),
            multispace1,
            take_until(" USING "),
            tag(" USING "),
        ),
    )
    .parse(input)
}

/// Access method name (`btree`, `gin`, ...)
pub(super) fn access_method(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// Content up to the `)` closing an already-consumed `(`, honoring nesting
/// and quoting.
fn balanced_content(input: &str) -> IResult<&str, &str> {
    match find_closing_paren(input) {
        Some(end) => Ok((&input[end..], &input[..end])),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::TakeUntil))),
    }
}

/// `( ... )`, returning the inside
pub(super) fn parenthesized(input: &str) -> IResult<&str, &str> {
    delimited(char('('), balanced_content, char(')')).parse(input)
}

/// One clause after the index body
pub(super) fn trailing_clause(input: &str) -> IResult<&str, Clause<'_>> {
    alt((
        map(
            preceded(pair(tag_no_case("INCLUDE"), multispace0), parenthesized),
            Clause::Include,
        ),
        map(
            preceded(pair(tag_no_case("WITH"), multispace0), parenthesized),
            |_| Clause::With,
        ),
        map(
            preceded(
                pair(tag_no_case("TABLESPACE"), multispace1),
                alt((recognize(quoted_identifier), bare_identifier)),
            ),
            |_| Clause::Tablespace,
        ),
        value(
            Clause::NullsNotDistinct,
            (
                tag_no_case("NULLS"),
                multispace1,
                tag_no_case("NOT"),
                multispace1,
                tag_no_case("DISTINCT"),
            ),
        ),
        map(preceded(tag_no_case("WHERE"), rest), Clause::Where),
    ))
    .parse(input)
}
