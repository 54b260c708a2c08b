use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gatherer::exec::{ExecError, ExecResult, QueryExecutor, QueryRows, SqliteExecutor};
use gatherer::gatherer::{GatherError, GatherState, Gatherer};
use gatherer::model::{parse_catalog, Catalog, Report, Schema};
use gatherer::planner::PlanError;
use gatherer::request::{RequestError, RequestParams};
use gatherer::sql::{Dialect, RenderedQuery};
use gatherer::worker::WorkerError;
use serde_json::json;

const CATALOG: &str = include_str!("../../demos/users.toml");
const SETUP: &str = include_str!("../../demos/users.sql");

fn catalog() -> Catalog {
    parse_catalog(CATALOG).unwrap()
}

fn sqlite() -> SqliteExecutor {
    let executor = SqliteExecutor::open_in_memory().unwrap();
    executor.execute_batch(SETUP).unwrap();
    executor
}

/// Records every statement and answers with a fixed result.
#[derive(Default)]
struct RecordingExecutor {
    seen: Mutex<Vec<RenderedQuery>>,
    fail: bool,
}

impl RecordingExecutor {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn seen(&self) -> Vec<RenderedQuery> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
    async fn execute(&self, query: &RenderedQuery) -> ExecResult<QueryRows> {
        self.seen.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(ExecError::Worker(WorkerError::QueryFailed(
                "connection reset".into(),
            )));
        }
        Ok(QueryRows {
            columns: vec!["user_id".into()],
            rows: vec![vec![json!(1)]],
        })
    }
}

// =============================================================================
// End to end through SQLite
// =============================================================================

#[tokio::test]
async fn test_sqlite_rows_are_joined_filtered_and_ordered() {
    let catalog = catalog();
    let report = catalog.report("users").unwrap();
    let params = RequestParams::from_query_string("userId=1&sortColumn=webpage&sortOrder=desc");

    let mut gatherer = Gatherer::from_request(&catalog.schema, report, params)
        .unwrap()
        .with_dialect(Dialect::Sqlite);
    let rows = gatherer.run(&sqlite()).await.unwrap();

    assert_eq!(gatherer.state(), GatherState::Done);
    assert_eq!(rows.columns, vec!["user_id", "username", "webpage"]);
    assert_eq!(
        rows.rows,
        vec![
            vec![json!(1), json!("alice"), json!("https://blog.alice.example")],
            vec![json!(1), json!("alice"), json!("https://alice.example")],
        ]
    );
}

#[tokio::test]
async fn test_sqlite_inner_join_drops_unmatched_origin_rows() {
    let catalog = catalog();
    let report = catalog.report("users").unwrap();
    let params = RequestParams::new().with("sortColumn", "users.user_id");

    let mut gatherer = Gatherer::from_request(&catalog.schema, report, params)
        .unwrap()
        .with_dialect(Dialect::Sqlite);
    let rows = gatherer.run(&sqlite()).await.unwrap();

    // carol has no webpages.
    let names: Vec<_> = rows.rows.iter().map(|r| r[1].clone()).collect();
    assert_eq!(names, vec![json!("alice"), json!("alice"), json!("bob")]);
}

#[tokio::test]
async fn test_sqlite_multi_column_filter_matches_any_candidate() {
    let catalog = catalog();
    let report = catalog.report("users").unwrap();
    let params = RequestParams::new().with("freeSearch", "https://bob.example");

    let mut gatherer = Gatherer::for_report(&catalog.schema, report, params)
        .with_dialect(Dialect::Sqlite);
    let rows = gatherer.run(&sqlite()).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows.to_objects()[0]["username"], json!("bob"));
}

#[tokio::test]
async fn test_sqlite_two_hop_report() {
    let catalog = catalog();
    let report = catalog.report("user_teams").unwrap();
    let params = RequestParams::new()
        .with("teamName", "design")
        .with("sortColumn", "username");

    let mut gatherer = Gatherer::from_request(&catalog.schema, report, params)
        .unwrap()
        .with_dialect(Dialect::Sqlite);
    let rows = gatherer.run(&sqlite()).await.unwrap();

    assert_eq!(
        rows.rows,
        vec![
            vec![json!("bob"), json!("design")],
            vec![json!("carol"), json!("design")],
        ]
    );
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn test_query_hook_sees_rendered_statement() {
    let catalog = catalog();
    let report = catalog.report("users").unwrap();
    let captured = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&captured);

    let mut gatherer =
        Gatherer::for_report(&catalog.schema, report, RequestParams::new().with("userId", 5))
            .with_query_hook(move |query| *sink.lock().unwrap() = Some(query.clone()));
    let executor = RecordingExecutor::default();
    gatherer.run(&executor).await.unwrap();

    let hooked = captured.lock().unwrap().clone().unwrap();
    assert_eq!(executor.seen(), vec![hooked.clone()]);
    assert!(hooked.sql.ends_with("where (users.user_id = ?);"));
    assert_eq!(hooked.params, vec![json!(5)]);
}

#[tokio::test]
async fn test_columns_frozen_after_run() {
    let catalog = catalog();
    let report = catalog.report("users").unwrap();
    let username = catalog.schema.column_by_key("Username").unwrap().id;

    let mut gatherer = Gatherer::new(&catalog.schema, report, RequestParams::new());
    gatherer.add_column(username).unwrap().add_column(username).unwrap();
    assert_eq!(gatherer.targets(), &[username]);

    gatherer.run(&RecordingExecutor::default()).await.unwrap();
    assert!(matches!(
        gatherer.add_column(username),
        Err(GatherError::NotCollecting(GatherState::Done))
    ));
    assert!(matches!(
        gatherer.run(&RecordingExecutor::default()).await,
        Err(GatherError::NotCollecting(GatherState::Done))
    ));
}

#[tokio::test]
async fn test_no_columns() {
    let catalog = catalog();
    let report = catalog.report("users").unwrap();
    let executor = RecordingExecutor::default();

    let mut gatherer = Gatherer::new(&catalog.schema, report, RequestParams::new());
    assert!(matches!(
        gatherer.run(&executor).await,
        Err(GatherError::NoColumns)
    ));
    assert_eq!(gatherer.state(), GatherState::Failed);
    assert!(executor.seen().is_empty());
}

#[tokio::test]
async fn test_unjoinable_column_sends_nothing() {
    let mut builder = Schema::builder();
    let users = builder.add_source("users").unwrap();
    let pages = builder.add_source("user_webpages").unwrap();
    builder.add_keyed_column("UsersUserId", "user_id", &[users]).unwrap();
    builder.add_keyed_column("PagesUserId", "user_id", &[pages]).unwrap();
    let webpage = builder.add_column("webpage", &[pages]).unwrap();
    let schema = builder.build().unwrap();
    let report = Report::new("pages", users);

    let mut gatherer = Gatherer::new(&schema, &report, RequestParams::new());
    gatherer.add_column(webpage).unwrap();
    let executor = RecordingExecutor::default();

    let err = gatherer.run(&executor).await.unwrap_err();
    assert!(matches!(
        err,
        GatherError::Plan(PlanError::UnjoinableColumn { .. })
    ));
    assert_eq!(gatherer.state(), GatherState::Failed);
    assert!(executor.seen().is_empty());
}

#[tokio::test]
async fn test_executor_error_fails_the_gather() {
    let catalog = catalog();
    let report = catalog.report("users").unwrap();
    let executor = RecordingExecutor::failing();

    let mut gatherer = Gatherer::for_report(&catalog.schema, report, RequestParams::new());
    let err = gatherer.run(&executor).await.unwrap_err();

    assert!(matches!(err, GatherError::Exec(ExecError::Worker(_))));
    assert_eq!(gatherer.state(), GatherState::Failed);
    assert_eq!(executor.seen().len(), 1);
}

#[test]
fn test_invalid_sort_order_rejected() {
    let catalog = catalog();
    let report = catalog.report("users").unwrap();
    let params = RequestParams::from_query_string("sortColumn=username&sortOrder=sideways");

    let err = Gatherer::from_request(&catalog.schema, report, params).unwrap_err();
    assert!(matches!(
        err,
        GatherError::Request(RequestError::InvalidSortOrder(_))
    ));
}

#[test]
fn test_prepare_does_not_change_state() {
    let catalog = catalog();
    let report = catalog.report("users").unwrap();
    let gatherer = Gatherer::for_report(&catalog.schema, report, RequestParams::new())
        .with_dialect(Dialect::Postgres);

    let first = gatherer.prepare().unwrap();
    let second = gatherer.prepare().unwrap();
    assert_eq!(first, second);
    assert_eq!(gatherer.state(), GatherState::Collecting);
}
