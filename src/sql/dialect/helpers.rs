//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Words that must be quoted even when they look like plain identifiers.
///
/// Covers the keywords a report statement can collide with in any supported
/// dialect; quoting an extra word is harmless, missing one is a syntax error.
const RESERVED: &[&str] = &[
    "all", "and", "as", "asc", "between", "by", "case", "check", "column", "create", "cross",
    "default", "delete", "desc", "distinct", "drop", "else", "end", "exists", "false", "for",
    "from", "full", "group", "having", "in", "index", "inner", "insert", "into", "is", "join",
    "key", "left", "like", "limit", "not", "null", "offset", "on", "or", "order", "outer",
    "primary", "references", "right", "select", "set", "table", "then", "true", "union",
    "unique", "update", "user", "using", "values", "when", "where", "with",
];

/// Whether `ident` can be emitted without quotes in every supported dialect.
///
/// Plain identifiers are lower case ASCII letters, digits and underscores,
/// not starting with a digit, and not a reserved word.
pub fn is_plain_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !RESERVED.contains(&ident)
}

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, DuckDB, SQLite
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Leave plain identifiers bare, otherwise apply `quote`.
pub fn quote_if_needed(ident: &str, quote: fn(&str) -> String) -> String {
    if is_plain_identifier(ident) {
        ident.to_string()
    } else {
        quote(ident)
    }
}

// =============================================================================
// Placeholders
// =============================================================================

/// Anonymous `?` placeholder; parameters bind in textual order.
/// Used by: MySQL
pub fn placeholder_question(_index: usize) -> String {
    "?".to_string()
}

/// Numbered `$n` placeholder.
/// Used by: Postgres, DuckDB
pub fn placeholder_dollar(index: usize) -> String {
    format!("${}", index)
}

/// Numbered `?n` placeholder.
/// Used by: SQLite
pub fn placeholder_numbered_question(index: usize) -> String {
    format!("?{}", index)
}
