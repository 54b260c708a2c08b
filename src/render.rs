//! Query rendering: join plan + targets + active filters + sort → statement.
//!
//! Output is a single `;`-terminated statement, one clause per line. Filter
//! values are always bound as positional parameters; the sort column is an
//! identifier escaped by the dialect.

use thiserror::Error;

use crate::model::{Column, ColumnId, Filter, Schema};
use crate::planner::JoinPlan;
use crate::request::{RequestParams, SortSpec};
use crate::sql::{
    any_of, col, param, table_col, Dialect, Expr, ExprExt, OrderByExpr, Query, RenderedQuery,
    TableRef,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// An active filter had no candidate column with a table in the plan.
    #[error("Filter '{filter}' is active but none of its columns is reachable in the join plan")]
    RenderingDefect { filter: String },

    /// A target column was never assigned by the resolver.
    #[error("Column '{0}' is not part of the join plan")]
    UnplannedColumn(String),

    #[error("Unknown schema reference: {0}")]
    UnknownReference(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Renders report statements against one schema in one dialect.
#[derive(Debug, Clone, Copy)]
pub struct QueryRenderer<'a> {
    schema: &'a Schema,
    dialect: Dialect,
}

impl<'a> QueryRenderer<'a> {
    pub fn new(schema: &'a Schema, dialect: Dialect) -> Self {
        Self { schema, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Render `targets` from `plan`, filtered by the active `filters` and
    /// ordered by `sort`.
    ///
    /// Pure: identical inputs give byte-identical text and parameters.
    pub fn render(
        &self,
        targets: &[ColumnId],
        plan: &JoinPlan,
        filters: &[Filter],
        params: &RequestParams,
        sort: Option<&SortSpec>,
    ) -> RenderResult<RenderedQuery> {
        let projection = targets
            .iter()
            .map(|id| self.projected(*id, plan))
            .collect::<RenderResult<Vec<_>>>()?;

        let mut query = Query::new()
            .select(projection)
            .from(TableRef::new(self.table_name(plan.origin().source)?));

        for joined in plan.joins() {
            let Some(join) = joined.join else {
                continue;
            };
            let table = self.table_name(joined.source)?;
            let through = self.table_name(join.through_source)?;
            let key = &self.column(join.through_column)?.name;
            query = query.inner_join(
                TableRef::new(table),
                table_col(table, key).eq(table_col(through, key)),
            );
        }

        for filter in filters {
            let Some(value) = params.get_active(&filter.name) else {
                continue;
            };
            query = query.filter(self.filter_group(filter, value, plan)?);
        }

        if let Some(sort) = sort {
            query = query.order_by(vec![OrderByExpr::new(sort_expr(&sort.column), sort.order)]);
        }

        Ok(query.to_statement(self.dialect))
    }

    fn projected(&self, id: ColumnId, plan: &JoinPlan) -> RenderResult<Expr> {
        let column = self.column(id)?;
        let table = plan
            .assignment(id)
            .ok_or_else(|| RenderError::UnplannedColumn(column.name.clone()))?;
        Ok(table_col(self.table_name(table.source)?, &column.name))
    }

    /// `(t1.c1 = ? or t2.c2 = ?)` over every qualifiable candidate.
    fn filter_group(
        &self,
        filter: &Filter,
        value: &serde_json::Value,
        plan: &JoinPlan,
    ) -> RenderResult<Expr> {
        let mut comparisons = Vec::with_capacity(filter.columns.len());
        for id in &filter.columns {
            let column = self.column(*id)?;
            let Some(source) = qualifying_source(column, plan) else {
                continue;
            };
            comparisons.push(
                table_col(self.table_name(source)?, &column.name).eq(param(value.clone())),
            );
        }

        any_of(comparisons)
            .map(Expr::paren)
            .ok_or_else(|| RenderError::RenderingDefect {
                filter: filter.name.clone(),
            })
    }

    fn column(&self, id: ColumnId) -> RenderResult<&'a Column> {
        self.schema
            .column(id)
            .ok_or_else(|| RenderError::UnknownReference(id.to_string()))
    }

    fn table_name(&self, id: crate::model::SourceId) -> RenderResult<&'a str> {
        self.schema
            .source(id)
            .map(|s| s.name.as_str())
            .ok_or_else(|| RenderError::UnknownReference(id.to_string()))
    }
}

/// The assigned table if the column was requested, else its first joined source.
fn qualifying_source(column: &Column, plan: &JoinPlan) -> Option<crate::model::SourceId> {
    if let Some(table) = plan.assignment(column.id) {
        return Some(table.source);
    }
    column
        .sources
        .iter()
        .copied()
        .find(|source| plan.contains_source(*source))
}

/// `table.column` splits into a qualified reference; anything else is one identifier.
fn sort_expr(column: &str) -> Expr {
    match column.split_once('.') {
        Some((table, name)) if !table.is_empty() && !name.is_empty() && !name.contains('.') => {
            table_col(table, name)
        }
        _ => col(column),
    }
}
