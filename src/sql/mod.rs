//! SQL generation module.
//!
//! A small type-safe builder for parameterized report statements:
//!
//! - [`query`] - SELECT query builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`params`] - positional parameter binding
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod expr;
pub mod params;
pub mod query;
pub mod token;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{any_of, col, param, table_col, BinaryOperator, Expr, ExprExt};
pub use params::Params;
pub use query::{Join, OrderByExpr, Query, RenderedQuery, SortDir, TableRef};
pub use token::{Token, TokenStream};
