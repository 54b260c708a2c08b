//! QueryExecutor backed by an embedded SQLite database.
//!
//! The connection lives behind a mutex and every statement runs on the
//! blocking thread pool, so the executor can be shared across tasks.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection};
use serde_json::{Number, Value};
use tracing::debug;

use super::{ExecError, ExecResult, QueryExecutor, QueryRows};
use crate::sql::RenderedQuery;

#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteExecutor {
    /// Open (or create) a database file.
    pub fn open<P: AsRef<Path>>(path: P) -> ExecResult<Self> {
        Ok(Self::from_connection(Connection::open(path)?))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> ExecResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    /// Open from a connection string: `:memory:` or a file path.
    pub fn connect(connection_string: &str) -> ExecResult<Self> {
        match connection_string {
            ":memory:" | "" => Self::open_in_memory(),
            path => Self::open(path),
        }
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run setup SQL (DDL, seed data) synchronously.
    pub fn execute_batch(&self, sql: &str) -> ExecResult<()> {
        let conn = self.conn.lock().map_err(|_| ExecError::Poisoned)?;
        conn.execute_batch(sql)?;
        Ok(())
    }

    fn run(conn: &Connection, query: &RenderedQuery) -> ExecResult<QueryRows> {
        let mut stmt = conn.prepare(&query.sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let args = query.params.iter().map(json_to_sql);
        let rows = stmt
            .query_map(params_from_iter(args), |row| {
                (0..width)
                    .map(|i| row.get::<_, SqlValue>(i).map(sql_to_json))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(QueryRows { columns, rows })
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute(&self, query: &RenderedQuery) -> ExecResult<QueryRows> {
        let conn = Arc::clone(&self.conn);
        let query = query.clone();

        let rows = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| ExecError::Poisoned)?;
            Self::run(&conn, &query)
        })
        .await??;

        debug!(rows = rows.len(), "sqlite statement finished");
        Ok(rows)
    }
}

fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn sql_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(bytes) => Value::from(bytes),
    }
}
