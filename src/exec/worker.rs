//! QueryExecutor backed by the database worker process.

use std::sync::Arc;

use async_trait::async_trait;

use super::{ExecResult, QueryExecutor, QueryRows};
use crate::sql::RenderedQuery;
use crate::worker::protocol::ConnectionParams;
use crate::worker::WorkerClient;

/// Runs statements through a shared [`WorkerClient`] against one connection.
///
/// # Example
///
/// ```ignore
/// use gatherer::exec::WorkerExecutor;
/// use gatherer::worker::WorkerClient;
///
/// let client = WorkerClient::spawn("./gatherer-worker").await?;
/// let executor = WorkerExecutor::with_client(client, "mysql", "mysql://localhost/reports");
/// ```
#[derive(Debug, Clone)]
pub struct WorkerExecutor {
    client: Arc<WorkerClient>,
    connection: ConnectionParams,
}

impl WorkerExecutor {
    /// Create a new executor over a shared client.
    pub fn new(
        client: Arc<WorkerClient>,
        driver: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            client,
            connection: ConnectionParams {
                driver: driver.into(),
                connection_string: connection_string.into(),
            },
        }
    }

    /// Convenience constructor that wraps the client in an Arc.
    pub fn with_client(
        client: WorkerClient,
        driver: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self::new(Arc::new(client), driver, connection_string)
    }

    pub fn driver(&self) -> &str {
        &self.connection.driver
    }

    pub fn connection_string(&self) -> &str {
        &self.connection.connection_string
    }
}

#[async_trait]
impl QueryExecutor for WorkerExecutor {
    async fn execute(&self, query: &RenderedQuery) -> ExecResult<QueryRows> {
        let response = self
            .client
            .execute_query(&self.connection, &query.sql, query.params.clone())
            .await?;

        Ok(QueryRows {
            columns: response.columns.into_iter().map(|c| c.name).collect(),
            rows: response.rows,
        })
    }
}
