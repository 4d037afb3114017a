//! Identifier grammar and string-literal normalization
//!
//! Small hand-written lexical helpers — identifier validation and
//! string-escape handling, the same kind of narrow utility a parser keeps
//! next to its front end for interpolation symbols and case conversion —
//! redirected at YANG's own lexical rules (RFC 6020 §6.2 identifier
//! grammar, §6.1.3 string literal escapes).

use crate::chars;

/// `identifier = (ALPHA / "_") *(ALPHA / DIGIT / "_" / "-" / ".")`
/// YANG additionally forbids the reserved prefix `xml` (any case) as the
/// first three characters of an identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars_iter = name.chars();
    let first = match chars_iter.next() {
        Some(c) => c,
        None => return false,
    };
    if !(first.is_ascii_alphabetic() || first == chars::UNDERSCORE) {
        return false;
    }
    if !chars_iter.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')) {
        return false;
    }
    if name.len() >= 3 && name[..3].eq_ignore_ascii_case("xml") {
        return false;
    }
    true
}

/// Split a possibly-prefixed identifier `[prefix:]local` used by type names,
/// leafref path segments, and if-feature expressions.
pub fn split_prefixed(name: &str) -> (Option<&str>, &str) {
    match name.find(':') {
        Some(idx) => (Some(&name[..idx]), &name[idx + 1..]),
        None => (None, name),
    }
}

/// Normalize a YANG double-quoted string literal: expand `\n \t \\ \"`
/// escapes, then re-indent multi-line bodies per §4.1 ("Builder contracts"):
/// a literal tab counts as eight columns, and leading whitespace up to the
/// opening-quote column is stripped from every line after the first.
pub fn normalize_dquote_string(raw: &str, open_quote_col: usize) -> String {
    let mut unescaped = String::with_capacity(raw.len());
    let mut chars_iter = raw.chars().peekable();
    while let Some(c) = chars_iter.next() {
        if c == '\\' {
            match chars_iter.next() {
                Some('n') => unescaped.push('\n'),
                Some('t') => unescaped.push('\t'),
                Some('\\') => unescaped.push('\\'),
                Some('"') => unescaped.push('"'),
                Some(other) => {
                    unescaped.push('\\');
                    unescaped.push(other);
                }
                None => unescaped.push('\\'),
            }
        } else {
            unescaped.push(c);
        }
    }
    reindent(&unescaped, open_quote_col)
}

/// Strip up to `indent_col` columns of leading whitespace from every line
/// after the first, expanding tabs to the next multiple of eight first.
fn reindent(text: &str, indent_col: usize) -> String {
    let mut lines = text.split('\n');
    let mut out = String::with_capacity(text.len());
    if let Some(first) = lines.next() {
        out.push_str(first);
    }
    for line in lines {
        out.push('\n');
        out.push_str(&strip_common_indent(line, indent_col));
    }
    out
}

/// Only whole leading-whitespace characters that fit entirely inside the
/// `indent_col` strip region are consumed. A character that would overshoot
/// the boundary (a tab jumping past it in one hop) is kept in full rather
/// than partially stripped, and — since the normalized form never contains
/// a raw tab — is expanded to the literal spaces its column width
/// represents.
fn strip_common_indent(line: &str, indent_col: usize) -> String {
    let bytes = line.as_bytes();
    let mut col = 0usize;
    let mut byte_idx = 0usize;
    while byte_idx < bytes.len() {
        match bytes[byte_idx] {
            b' ' if col < indent_col => {
                col += 1;
                byte_idx += 1;
            }
            b'\t' => {
                let new_col = (col / 8 + 1) * 8;
                if new_col <= indent_col {
                    col = new_col;
                    byte_idx += 1;
                } else {
                    let mut out = " ".repeat(new_col - col);
                    out.push_str(&line[byte_idx + 1..]);
                    return out;
                }
            }
            _ => break,
        }
    }
    line[byte_idx..].to_string()
}

/// A semantic version used only for the crate-level `compiled_with` marker
/// surfaced in diagnostics; no parsing logic in the original collaborator
/// depends on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub const CURRENT: Version = Version { major: 0, minor: 1, patch: 0 };
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
