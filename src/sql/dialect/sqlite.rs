//! SQLite SQL dialect.
//!
//! - ANSI identifier quoting (`"`)
//! - Numbered `?n` placeholders, so a parameter can be referenced by position

use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_if_needed(ident, helpers::quote_double)
    }

    fn placeholder(&self, index: usize) -> String {
        helpers::placeholder_numbered_question(index)
    }
}
