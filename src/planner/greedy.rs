//! Greedy single-pass join resolution.
//!
//! Columns are placed in registration order. A column whose source is
//! already in the plan is assigned there; otherwise the first joined table
//! that shares a column with one of its sources pulls that source in.
//! There is no backtracking and no multi-hop search: a column only reachable
//! through a table nobody requested fails with `UnjoinableColumn`.

use tracing::debug;

use super::{JoinPlan, JoinResolver, JoinThrough, PlanError, PlanResult};
use crate::model::{Column, ColumnId, Schema, SourceId};

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyResolver;

impl GreedyResolver {
    pub fn new() -> Self {
        Self
    }

    /// First source of `column` already present in the plan.
    fn existing_table(plan: &JoinPlan, column: &Column) -> Option<SourceId> {
        column
            .sources
            .iter()
            .copied()
            .find(|source| plan.contains_source(*source))
    }

    /// First (joined table, candidate source) pair sharing a column.
    fn new_table(
        schema: &Schema,
        plan: &JoinPlan,
        column: &Column,
    ) -> PlanResult<Option<(SourceId, JoinThrough)>> {
        for joined in plan.tables() {
            let joined_source = schema
                .source(joined.source)
                .ok_or_else(|| PlanError::UnknownSource(joined.source.to_string()))?;
            for shared in &joined_source.columns {
                for candidate in &column.sources {
                    let candidate_source = schema
                        .source(*candidate)
                        .ok_or_else(|| PlanError::UnknownSource(candidate.to_string()))?;
                    if candidate_source.columns.contains(shared) {
                        return Ok(Some((
                            *candidate,
                            JoinThrough {
                                through_source: joined.source,
                                through_column: *shared,
                            },
                        )));
                    }
                }
            }
        }
        Ok(None)
    }

    fn unjoinable(schema: &Schema, column: &Column) -> PlanError {
        PlanError::UnjoinableColumn {
            column: column.name.clone(),
            sources: column
                .sources
                .iter()
                .filter_map(|id| schema.source(*id))
                .map(|s| s.name.clone())
                .collect(),
        }
    }
}

impl JoinResolver for GreedyResolver {
    fn resolve(
        &self,
        schema: &Schema,
        origin: SourceId,
        requested: &[ColumnId],
    ) -> PlanResult<JoinPlan> {
        if schema.source(origin).is_none() {
            return Err(PlanError::UnknownSource(origin.to_string()));
        }
        let mut plan = JoinPlan::new(origin);

        for id in requested {
            let column = schema
                .column(*id)
                .ok_or_else(|| PlanError::UnknownColumn(id.to_string()))?;

            if let Some(source) = Self::existing_table(&plan, column) {
                plan.assign(source, column.id);
                continue;
            }

            match Self::new_table(schema, &plan, column)? {
                Some((source, join)) => {
                    debug!(
                        column = %column.name,
                        source = %source,
                        through = %join.through_source,
                        "joining new table"
                    );
                    plan.attach(source, join, column.id);
                }
                None => return Err(Self::unjoinable(schema, column)),
            }
        }

        Ok(plan)
    }
}
