//! Database drivers a connection can name.
//!
//! The driver decides two things: which executor runs the statement
//! (embedded SQLite or the worker process) and which SQL dialect the
//! statement is rendered in.

use crate::sql::Dialect;

/// Error type for connection configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("Unsupported driver: {0}. Supported: mysql, postgres, sqlite, duckdb")]
    UnsupportedDriver(String),
}

/// Supported database drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// MySQL / MariaDB, through the worker
    MySql,
    /// PostgreSQL, through the worker
    Postgres,
    /// SQLite (file or in-memory), embedded
    Sqlite,
    /// DuckDB (file or in-memory), through the worker
    DuckDb,
}

impl Driver {
    /// Parse driver from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConnectionError> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Driver::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Driver::Postgres),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            "duckdb" | "duck" => Ok(Driver::DuckDb),
            other => Err(ConnectionError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Get the driver name for the worker.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::MySql => "mysql",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
            Driver::DuckDb => "duckdb",
        }
    }

    /// Dialect statements for this driver are rendered in.
    pub fn dialect(&self) -> Dialect {
        match self {
            Driver::MySql => Dialect::MySql,
            Driver::Postgres => Dialect::Postgres,
            Driver::Sqlite => Dialect::Sqlite,
            Driver::DuckDb => Dialect::DuckDb,
        }
    }

    /// Whether statements run in-process instead of through the worker.
    pub fn is_embedded(&self) -> bool {
        matches!(self, Driver::Sqlite)
    }
}
