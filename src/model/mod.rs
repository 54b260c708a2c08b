//! Schema and report declarations.
//!
//! Both are built once at startup and are read-only afterwards; share them
//! by reference or behind an `Arc`.

pub mod loader;
pub mod report;
pub mod schema;

pub use loader::{load_catalog, parse_catalog, Catalog, LoadError, LoadResult};
pub use report::{
    ColumnDescription, DisplayType, Filter, Report, ReportColumn, ReportDescription,
};
pub use schema::{
    Column, ColumnId, JoinHop, Schema, SchemaBuilder, SchemaError, SchemaResult, Source,
    SourceId,
};
