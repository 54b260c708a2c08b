//! Per-request orchestration: collect columns, resolve, render, execute.
//!
//! A `Gatherer` is created for one request against a shared schema and
//! report and dropped once the query completes. Its lifecycle:
//!
//! ```text
//! Collecting ──run()──▶ Resolving ──▶ Rendering ──▶ Executing ──▶ Done
//!                           │             │             │
//!                           └─────────────┴─────────────┴──────▶ Failed
//! ```
//!
//! Nothing is rendered when resolution fails and nothing is sent when
//! rendering fails. There are no partial results and no retries.

use thiserror::Error;
use tracing::debug;

use crate::exec::{ExecError, QueryExecutor, QueryRows};
use crate::model::{ColumnId, Report, Schema};
use crate::planner::{GreedyResolver, JoinPlan, JoinResolver, PlanError};
use crate::render::{QueryRenderer, RenderError};
use crate::request::{RequestError, RequestParams, SortSpec};
use crate::sql::{Dialect, RenderedQuery};

/// Lifecycle of one gather.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatherState {
    Collecting,
    Resolving,
    Rendering,
    Executing,
    Done,
    Failed,
}

#[derive(Debug, Error)]
pub enum GatherError {
    #[error("Columns can only be added while collecting (state: {0:?})")]
    NotCollecting(GatherState),

    #[error("No columns requested")]
    NoColumns,

    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Query execution failed: {0}")]
    Exec(#[from] ExecError),
}

pub type GatherResult<T> = Result<T, GatherError>;

/// Callback receiving every statement just before it is executed.
pub type QueryHook = Box<dyn Fn(&RenderedQuery) + Send + Sync>;

pub struct Gatherer<'a> {
    schema: &'a Schema,
    report: &'a Report,
    params: RequestParams,
    targets: Vec<ColumnId>,
    sort: Option<SortSpec>,
    dialect: Dialect,
    resolver: Box<dyn JoinResolver>,
    hook: Option<QueryHook>,
    state: GatherState,
}

impl std::fmt::Debug for Gatherer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gatherer")
            .field("report", &self.report.name)
            .field("targets", &self.targets)
            .field("sort", &self.sort)
            .field("dialect", &self.dialect)
            .field("resolver", &self.resolver)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a> Gatherer<'a> {
    /// Empty gatherer: no targets, no sort, default dialect and resolver.
    pub fn new(schema: &'a Schema, report: &'a Report, params: RequestParams) -> Self {
        Self {
            schema,
            report,
            params,
            targets: Vec::new(),
            sort: None,
            dialect: Dialect::default(),
            resolver: Box::new(GreedyResolver),
            hook: None,
            state: GatherState::Collecting,
        }
    }

    /// Gatherer with every report column registered in declaration order.
    pub fn for_report(schema: &'a Schema, report: &'a Report, params: RequestParams) -> Self {
        let mut gatherer = Self::new(schema, report, params);
        gatherer.targets = dedup(report.column_ids());
        gatherer
    }

    /// [`Gatherer::for_report`] plus the sort carried by the request parameters.
    pub fn from_request(
        schema: &'a Schema,
        report: &'a Report,
        params: RequestParams,
    ) -> GatherResult<Self> {
        let sort = SortSpec::from_params(&params)?;
        Ok(Self::for_report(schema, report, params).with_sort(sort))
    }

    pub fn with_sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_resolver(mut self, resolver: impl JoinResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_query_hook(mut self, hook: impl Fn(&RenderedQuery) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Register a target column. Repeats are ignored.
    pub fn add_column(&mut self, column: ColumnId) -> GatherResult<&mut Self> {
        if self.state != GatherState::Collecting {
            return Err(GatherError::NotCollecting(self.state));
        }
        if self.schema.column(column).is_none() {
            return Err(GatherError::UnknownColumn(column.to_string()));
        }
        if !self.targets.contains(&column) {
            self.targets.push(column);
        }
        Ok(self)
    }

    pub fn state(&self) -> GatherState {
        self.state
    }

    pub fn targets(&self) -> &[ColumnId] {
        &self.targets
    }

    pub fn params(&self) -> &RequestParams {
        &self.params
    }

    /// Resolve the join plan for the current targets.
    pub fn resolve(&self) -> GatherResult<JoinPlan> {
        if self.targets.is_empty() {
            return Err(GatherError::NoColumns);
        }
        Ok(self
            .resolver
            .resolve(self.schema, self.report.origin, &self.targets)?)
    }

    /// Resolve and render without executing or changing state.
    pub fn prepare(&self) -> GatherResult<RenderedQuery> {
        let plan = self.resolve()?;
        self.render(&plan)
    }

    fn render(&self, plan: &JoinPlan) -> GatherResult<RenderedQuery> {
        Ok(QueryRenderer::new(self.schema, self.dialect).render(
            &self.targets,
            plan,
            &self.report.filters,
            &self.params,
            self.sort.as_ref(),
        )?)
    }

    /// Resolve, render and execute. A gatherer runs at most once.
    pub async fn run<E>(&mut self, executor: &E) -> GatherResult<QueryRows>
    where
        E: QueryExecutor + ?Sized,
    {
        if self.state != GatherState::Collecting {
            return Err(GatherError::NotCollecting(self.state));
        }

        self.state = GatherState::Resolving;
        let plan = self.resolve().inspect_err(|_| self.state = GatherState::Failed)?;
        debug!(report = %self.report.name, tables = plan.len(), "resolved join plan");

        self.state = GatherState::Rendering;
        let query = self
            .render(&plan)
            .inspect_err(|_| self.state = GatherState::Failed)?;
        debug!(
            report = %self.report.name,
            dialect = %self.dialect,
            sql = %query.sql,
            params = ?query.params,
            "rendered report query"
        );
        if let Some(hook) = &self.hook {
            hook(&query);
        }

        self.state = GatherState::Executing;
        match executor.execute(&query).await {
            Ok(rows) => {
                self.state = GatherState::Done;
                Ok(rows)
            }
            Err(e) => {
                self.state = GatherState::Failed;
                Err(e.into())
            }
        }
    }
}

fn dedup(columns: impl Iterator<Item = ColumnId>) -> Vec<ColumnId> {
    let mut out = Vec::new();
    for column in columns {
        if !out.contains(&column) {
            out.push(column);
        }
    }
    out
}
