//! # gatherer
//!
//! Declarative report gathering: infer the joins a report needs, render one
//! parameterized statement, and fetch the rows.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Catalog (TOML) / SchemaBuilder + Report           │
//! │     (sources, multi-homed columns, filters, display)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Gatherer: targets + request params]
//! ┌─────────────────────────────────────────────────────────┐
//! │              JoinResolver (GreedyResolver)               │
//! │        origin-rooted JoinPlan, discovery order           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [QueryRenderer]
//! ┌─────────────────────────────────────────────────────────┐
//! │        RenderedQuery { sql, params } per dialect         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [QueryExecutor]
//! ┌─────────────────────────────────────────────────────────┐
//! │      worker process (MySQL/Postgres/DuckDB) | SQLite     │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use gatherer::prelude::*;
//!
//! let catalog = parse_catalog(include_str!("users.toml"))?;
//! let report = catalog.report("users").unwrap();
//! let params = RequestParams::from_query_string("userId=5&sortColumn=username");
//!
//! let mut gatherer = Gatherer::from_request(&catalog.schema, report, params)?;
//! let rows = gatherer.run(&executor).await?;
//! ```

pub mod config;
pub mod exec;
pub mod gatherer;
pub mod model;
pub mod planner;
pub mod render;
pub mod request;
pub mod sql;
pub mod validation;
pub mod worker;

pub use sql::dialect;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::exec::{ExecError, QueryExecutor, QueryRows, SqliteExecutor, WorkerExecutor};
    pub use crate::gatherer::{GatherError, GatherState, Gatherer};
    pub use crate::model::{
        load_catalog, parse_catalog, Catalog, ColumnId, DisplayType, Report, Schema,
        SchemaBuilder, SourceId,
    };
    pub use crate::planner::{GreedyResolver, JoinPlan, JoinResolver, PlanError};
    pub use crate::render::{QueryRenderer, RenderError};
    pub use crate::request::{RequestParams, SortSpec};
    pub use crate::sql::{RenderedQuery, SortDir};
}
