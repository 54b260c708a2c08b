//! Join planning - decides which table supplies each requested column.
//!
//! A [`JoinPlan`] is rooted at the report's origin and lists every table the
//! statement touches, in discovery order. Each later table records the
//! already-joined table and shared column it is reached through.

pub mod greedy;

pub use greedy::GreedyResolver;

use crate::model::{ColumnId, Schema, SourceId};
use thiserror::Error;

/// Errors that can occur during planning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// No joined table shares a column with any source of this column.
    #[error("Column '{column}' cannot be joined; candidate sources: {}", sources.join(", "))]
    UnjoinableColumn { column: String, sources: Vec<String> },

    #[error("Source not found: {0}")]
    UnknownSource(String),

    #[error("Column not found: {0}")]
    UnknownColumn(String),
}

pub type PlanResult<T> = Result<T, PlanError>;

/// How a table is attached: `through_source.through_column = this.through_column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinThrough {
    pub through_source: SourceId,
    pub through_column: ColumnId,
}

/// One table instance in a plan with the requested columns assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedTable {
    pub source: SourceId,
    pub columns: Vec<ColumnId>,
    /// `None` only for the origin.
    pub join: Option<JoinThrough>,
}

impl JoinedTable {
    fn origin(source: SourceId) -> Self {
        Self {
            source,
            columns: Vec::new(),
            join: None,
        }
    }
}

/// Ordered join plan, origin first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPlan {
    tables: Vec<JoinedTable>,
}

impl JoinPlan {
    /// A plan holding only the origin, with no columns assigned.
    pub fn new(origin: SourceId) -> Self {
        Self {
            tables: vec![JoinedTable::origin(origin)],
        }
    }

    pub fn origin(&self) -> &JoinedTable {
        &self.tables[0]
    }

    /// Every table, origin first, in discovery order.
    pub fn tables(&self) -> &[JoinedTable] {
        &self.tables
    }

    /// Tables after the origin.
    pub fn joins(&self) -> &[JoinedTable] {
        &self.tables[1..]
    }

    pub fn table_for(&self, source: SourceId) -> Option<&JoinedTable> {
        self.tables.iter().find(|t| t.source == source)
    }

    pub fn contains_source(&self, source: SourceId) -> bool {
        self.table_for(source).is_some()
    }

    /// The table a requested column was assigned to.
    pub fn assignment(&self, column: ColumnId) -> Option<&JoinedTable> {
        self.tables.iter().find(|t| t.columns.contains(&column))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Assign `column` to the table for `source`, which must already be joined.
    pub(crate) fn assign(&mut self, source: SourceId, column: ColumnId) {
        if let Some(table) = self.tables.iter_mut().find(|t| t.source == source) {
            if !table.columns.contains(&column) {
                table.columns.push(column);
            }
        }
    }

    pub(crate) fn attach(&mut self, source: SourceId, join: JoinThrough, column: ColumnId) {
        self.tables.push(JoinedTable {
            source,
            columns: vec![column],
            join: Some(join),
        });
    }
}

/// Computes a spanning join plan rooted at `origin` for the requested columns.
///
/// Implementations must be deterministic: the same inputs yield the same plan.
pub trait JoinResolver: std::fmt::Debug + Send + Sync {
    fn resolve(
        &self,
        schema: &Schema,
        origin: SourceId,
        requested: &[ColumnId],
    ) -> PlanResult<JoinPlan>;
}
