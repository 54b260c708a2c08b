//! Query execution collaborators.
//!
//! The gatherer hands a rendered statement to a [`QueryExecutor`] and gets
//! rows back. Two implementations ship with the crate:
//!
//! - [`WorkerExecutor`] - forwards to the database worker process
//! - [`SqliteExecutor`] - runs against an embedded SQLite database
//!
//! Any executor error fails the request; there is no retry.

mod sqlite;
mod worker;

pub use sqlite::SqliteExecutor;
pub use worker::WorkerExecutor;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::sql::RenderedQuery;
use crate::worker::WorkerError;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("worker: {0}")]
    Worker(#[from] WorkerError),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("blocking task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),

    #[error("database connection lock poisoned")]
    Poisoned,
}

pub type ExecResult<T> = Result<T, ExecError>;

/// Result set returned by an executor. Opaque to the planner and renderer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as `column name → value` objects, in column order.
    pub fn to_objects(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }
}

/// Executes one rendered statement with its bound parameters.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &RenderedQuery) -> ExecResult<QueryRows>;
}
