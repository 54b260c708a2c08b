//! DuckDB SQL dialect.
//!
//! DuckDB is PostgreSQL-compatible for everything a report statement uses:
//! ANSI identifier quoting and `$n` placeholders.

use super::helpers;
use super::SqlDialect;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_if_needed(ident, helpers::quote_double)
    }

    fn placeholder(&self, index: usize) -> String {
        helpers::placeholder_dollar(index)
    }
}
