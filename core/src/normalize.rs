//! Predicate and expression normalization
//!
//! `pg_get_indexdef` and `pg_get_expr` decorate expressions with parentheses
//! and explicit casts that depend on the server version and on the declared
//! column types. The functions here rewrite that text into a steadier form.
//! They are purely textual and best effort: some casts survive, and callers
//! comparing normalized text must allow for that.

use std::sync::LazyLock;

use regex::Regex;

use crate::sql_text::{Segment, collapse_whitespace, find_closing_paren, segments};

/// A cast suffix such as `::text`, `::character varying(20)` or `::text[]`.
const CAST: &str = r#"::(?:character varying|double precision|bit varying|time(?:stamp)? with(?:out)? time zone|"[^"]+"|[A-Za-z_][A-Za-z0-9_.]*)(?:\(\d+(?:,\s*\d+)?\))?(?:\[\])*"#;

/// Two or more casts chained directly onto a string literal.
static LITERAL_CAST_CHAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{CAST}){{2,}}")).expect("literal cast chain pattern")
});

static SINGLE_CAST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{CAST}$")).expect("cast pattern"));

/// `(ident)::` where the parenthesis is not a function call.
static PAREN_IDENT_CAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(^|[^A-Za-z0-9_"])\(([A-Za-z_][A-Za-z0-9_$]*|"(?:[^"]|"")+")\)::"#)
        .expect("parenthesized identifier pattern")
});

/// `IN (`, `= ANY (`, and `<> ALL (` / `!= ALL (` (the server's `NOT IN`).
static VALUE_LIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bIN\s*\(|=\s*ANY\s*\(|(?:<>|!=)\s*ALL\s*\()")
        .expect("value list pattern")
});

/// Normalize a partial-index predicate.
///
/// ```
/// use drizzle_indexes_core::normalize_predicate;
///
/// assert_eq!(
///     normalize_predicate("((state)::text = 'active'::text)"),
///     "state::text = 'active'::text"
/// );
/// ```
pub fn normalize_predicate(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    rewrite_casts(strip_outer_parens(&collapsed))
}

/// Normalize the text of an expression index. Unlike predicates the outer
/// shape (`gin (...)`) is kept as is.
pub fn normalize_expression(text: &str) -> String {
    rewrite_casts(&collapse_whitespace(text))
}

/// Whether a predicate restricts a column against a list of values, either
/// as written (`IN (...)`, `NOT IN (...)`) or as the server renders it
/// (`= ANY (ARRAY[...])`, `<> ALL (ARRAY[...])`).
pub fn has_value_list(predicate: &str) -> bool {
    segments(predicate).into_iter().any(|segment| match segment {
        Segment::Code(code) => VALUE_LIST.is_match(code),
        Segment::Literal(_) => false,
    })
}

/// Drop parentheses that wrap the entire text, repeatedly.
pub(crate) fn strip_outer_parens(mut text: &str) -> &str {
    loop {
        let trimmed = text.trim();
        let Some(inner) = trimmed.strip_prefix('(') else {
            return trimmed;
        };
        match find_closing_paren(inner) {
            Some(close) if close + 1 == inner.len() => text = &inner[..close],
            _ => return trimmed,
        }
    }
}

fn rewrite_casts(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut after_literal = false;

    for segment in segments(text) {
        match segment {
            Segment::Literal(lit) => {
                out.push_str(lit);
                after_literal = true;
            }
            Segment::Code(code) => {
                let code = if after_literal {
                    collapse_literal_casts(code)
                } else {
                    code.to_string()
                };
                out.push_str(&PAREN_IDENT_CAST.replace_all(&code, "${1}${2}::"));
                after_literal = false;
            }
        }
    }
    out
}

/// `'a'::character varying::text` keeps only the outermost cast.
fn collapse_literal_casts(code: &str) -> String {
    let Some(chain) = LITERAL_CAST_CHAIN.find(code) else {
        return code.to_string();
    };
    let casts = chain.as_str();
    let last = SINGLE_CAST
        .find(casts)
        .map(|m| m.as_str())
        .unwrap_or(casts);
    format!("{last}{}", &code[chain.end()..])
}
