//! Type definitions of a low-level SQL string representation, and the escaping rules shared by
//! both output dialects.

use serde::Serialize;

/// Printed SQL together with the values of its parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SQL {
    pub sql: String,
    pub params: Vec<Param>,
}

/// A value bound to a `%(hogql_val_N)s` marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    String(String),
    Integer(i64),
    Float(f64),
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Param::String(s) => write!(f, "{s}"),
            Param::Integer(i) => write!(f, "{i}"),
            Param::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<i64> for Param {
    fn from(value: i64) -> Self {
        Param::Integer(value)
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::String(value.to_string())
    }
}

/// The marker for the parameter at `index`.
pub fn parameter_token(index: usize) -> String {
    format!("%(hogql_val_{index})s")
}

fn escape_char(c: char, quote: char, out: &mut String) {
    match c {
        '\u{8}' => out.push_str("\\b"),
        '\u{c}' => out.push_str("\\f"),
        '\r' => out.push_str("\\r"),
        '\n' => out.push_str("\\n"),
        '\t' => out.push_str("\\t"),
        '\0' => out.push_str("\\0"),
        '\u{7}' => out.push_str("\\a"),
        '\u{b}' => out.push_str("\\v"),
        '\\' => out.push_str("\\\\"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        c => out.push(c),
    }
}

fn quote_with(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        escape_char(c, quote, &mut out);
    }
    out.push(quote);
    out
}

/// Whether an identifier can be printed without quotes.
pub fn is_simple_identifier(identifier: &str) -> bool {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Print an identifier, backtick-quoting it when needed.
pub fn escape_identifier(identifier: &str) -> String {
    if is_simple_identifier(identifier) {
        identifier.to_string()
    } else {
        quote_identifier(identifier)
    }
}

/// Print an identifier in backticks, whatever it contains.
pub fn quote_identifier(identifier: &str) -> String {
    quote_with(identifier, '`')
}

/// Print a string literal in single quotes.
pub fn escape_string(value: &str) -> String {
    quote_with(value, '\'')
}
