//! Quote-aware scanning over catalog SQL text
//!
//! PostgreSQL index definitions embed string literals (`'english'::regconfig`)
//! and quoted identifiers (`"User Name"`) that may contain parentheses, commas
//! or whitespace. Everything in here skips over quoted text so that structure
//! is only ever read from the unquoted parts.

use std::iter::Peekable;
use std::str::CharIndices;

/// Iterator over the `(byte_index, char)` pairs of `s` that sit outside
/// single- or double-quoted text. Doubled quotes inside quoted text are
/// treated as escapes.
pub(crate) struct Unquoted<'a> {
    chars: Peekable<CharIndices<'a>>,
    quote: Option<char>,
}

impl<'a> Unquoted<'a> {
    pub(crate) fn new(s: &'a str) -> Self {
        Self {
            chars: s.char_indices().peekable(),
            quote: None,
        }
    }
}

impl Iterator for Unquoted<'_> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((i, c)) = self.chars.next() {
            match self.quote {
                Some(q) if c == q => {
                    if self.chars.peek().is_some_and(|&(_, n)| n == q) {
                        self.chars.next();
                    } else {
                        self.quote = None;
                    }
                }
                Some(_) => {}
                None if c == '\'' || c == '"' => self.quote = Some(c),
                None => return Some((i, c)),
            }
        }
        None
    }
}

/// Byte index of the `)` that closes an already-opened `(`, i.e. the first
/// unquoted `)` at nesting depth zero.
pub(crate) fn find_closing_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in Unquoted::new(s) {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Split on top-level commas. Pieces are trimmed; empty pieces are kept so
/// callers can reject them.
pub(crate) fn split_commas(s: &str) -> Vec<&str> {
    split_top_level(s, |c| c == ',')
        .into_iter()
        .map(str::trim)
        .collect()
}

/// Split on top-level whitespace, dropping empty pieces.
pub(crate) fn split_words(s: &str) -> Vec<&str> {
    split_top_level(s, char::is_whitespace)
        .into_iter()
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect()
}

fn split_top_level(s: &str, is_separator: impl Fn(char) -> bool) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in Unquoted::new(s) {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            c if depth == 0 && is_separator(c) => {
                pieces.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(&s[start..]);
    pieces
}

/// A run of text that is either a single-quoted string literal (quotes
/// included) or anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Code(&'a str),
    Literal(&'a str),
}

/// Cut `s` into alternating code and string-literal segments. An
/// unterminated literal runs to the end of the input.
pub(crate) fn segments(s: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut chars = s.char_indices().peekable();
    let mut start = 0;

    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            continue;
        }
        if i > start {
            out.push(Segment::Code(&s[start..i]));
        }
        let mut end = s.len();
        while let Some((j, n)) = chars.next() {
            if n == '\'' {
                if chars.peek().is_some_and(|&(_, m)| m == '\'') {
                    chars.next();
                } else {
                    end = j + 1;
                    break;
                }
            }
        }
        out.push(Segment::Literal(&s[i..end]));
        start = end;
    }
    if start < s.len() {
        out.push(Segment::Code(&s[start..]));
    }
    out
}

/// Collapse whitespace runs outside string literals to a single space and
/// trim both ends.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for segment in segments(s) {
        match segment {
            Segment::Literal(lit) => out.push_str(lit),
            Segment::Code(code) => {
                let mut pending_space = false;
                for c in code.chars() {
                    if c.is_whitespace() {
                        pending_space = true;
                        continue;
                    }
                    if pending_space && !out.is_empty() {
                        out.push(' ');
                    }
                    pending_space = false;
                    out.push(c);
                }
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
            }
        }
    }
    out.trim().to_string()
}
