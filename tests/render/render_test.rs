use gatherer::model::{ColumnId, Filter, Schema, SourceId};
use gatherer::planner::{GreedyResolver, JoinPlan, JoinResolver};
use gatherer::render::{QueryRenderer, RenderError};
use gatherer::request::{RequestParams, SortSpec};
use gatherer::sql::{Dialect, SortDir};
use insta::assert_snapshot;
use serde_json::json;
use sqlparser::dialect::{GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

struct Fixture {
    schema: Schema,
    users: SourceId,
    user_id: ColumnId,
    username: ColumnId,
    webpage: ColumnId,
    team_name: ColumnId,
}

fn fixture() -> Fixture {
    let mut builder = Schema::builder();
    let users = builder.add_source("users").unwrap();
    let pages = builder.add_source("user_webpages").unwrap();
    let teams = builder.add_source("teams").unwrap();
    let user_id = builder.add_column("user_id", &[users, pages]).unwrap();
    let username = builder.add_column("username", &[users]).unwrap();
    builder.add_column("team_id", &[users, teams]).unwrap();
    let webpage = builder.add_column("webpage", &[pages]).unwrap();
    let team_name = builder.add_column("team_name", &[teams]).unwrap();
    Fixture {
        schema: builder.build().unwrap(),
        users,
        user_id,
        username,
        webpage,
        team_name,
    }
}

impl Fixture {
    fn targets(&self) -> Vec<ColumnId> {
        vec![self.user_id, self.username, self.webpage]
    }

    fn plan(&self, targets: &[ColumnId]) -> JoinPlan {
        GreedyResolver
            .resolve(&self.schema, self.users, targets)
            .unwrap()
    }

    fn filters(&self) -> Vec<Filter> {
        vec![
            Filter {
                name: "userId".into(),
                columns: vec![self.user_id],
            },
            Filter {
                name: "freeSearch".into(),
                columns: vec![self.username, self.webpage],
            },
        ]
    }
}

#[test]
fn test_projection_and_join_clause() {
    let f = fixture();
    let targets = f.targets();
    let rendered = QueryRenderer::new(&f.schema, Dialect::MySql)
        .render(&targets, &f.plan(&targets), &[], &RequestParams::new(), None)
        .unwrap();

    assert_snapshot!(rendered.sql, @r"
select users.user_id, users.username, user_webpages.webpage
from users
inner join user_webpages on user_webpages.user_id = users.user_id;
");
    assert!(rendered.params.is_empty());
}

#[test]
fn test_single_filter_binds_one_parameter() {
    let f = fixture();
    let targets = f.targets();
    let params = RequestParams::new().with("userId", 5);
    let rendered = QueryRenderer::new(&f.schema, Dialect::MySql)
        .render(&targets, &f.plan(&targets), &f.filters(), &params, None)
        .unwrap();

    assert!(rendered.sql.ends_with("\nwhere (users.user_id = ?);"));
    assert_eq!(rendered.sql.matches("where").count(), 1);
    assert_eq!(rendered.params, vec![json!(5)]);
}

#[test]
fn test_multi_column_filter_is_or_group_and_filters_are_anded() {
    let f = fixture();
    let targets = f.targets();
    let params = RequestParams::new()
        .with("userId", 1)
        .with("freeSearch", "alice");
    let rendered = QueryRenderer::new(&f.schema, Dialect::Postgres)
        .render(&targets, &f.plan(&targets), &f.filters(), &params, None)
        .unwrap();

    assert_snapshot!(rendered.sql, @r"
select users.user_id, users.username, user_webpages.webpage
from users
inner join user_webpages on user_webpages.user_id = users.user_id
where (users.user_id = $1) and (users.username = $2 or user_webpages.webpage = $3);
");
    assert_eq!(rendered.params, vec![json!(1), json!("alice"), json!("alice")]);
}

#[test]
fn test_absent_and_null_filters_are_inactive() {
    let f = fixture();
    let targets = f.targets();
    let plan = f.plan(&targets);
    let renderer = QueryRenderer::new(&f.schema, Dialect::MySql);

    let bare = renderer
        .render(&targets, &plan, &f.filters(), &RequestParams::new(), None)
        .unwrap();
    let nulls = renderer
        .render(
            &targets,
            &plan,
            &f.filters(),
            &RequestParams::new()
                .with("userId", json!(null))
                .with("unrelated", 3),
            None,
        )
        .unwrap();
    let empty = renderer
        .render(
            &targets,
            &plan,
            &f.filters(),
            &RequestParams::from_query_string("userId=&freeSearch="),
            None,
        )
        .unwrap();

    assert!(!bare.sql.contains("where"));
    assert_eq!(bare, nulls);
    assert_eq!(bare, empty);
}

#[test]
fn test_unrequested_filter_column_qualified_by_joined_source() {
    let f = fixture();
    // Only username is requested; user_id is filtered on but never projected.
    let targets = vec![f.username];
    let params = RequestParams::new().with("userId", 2);
    let rendered = QueryRenderer::new(&f.schema, Dialect::Sqlite)
        .render(&targets, &f.plan(&targets), &f.filters(), &params, None)
        .unwrap();

    assert_snapshot!(rendered.sql, @r"
select users.username
from users
where (users.user_id = ?1);
");
}

#[test]
fn test_filter_candidates_outside_plan_are_skipped() {
    let f = fixture();
    let targets = vec![f.username];
    let filters = vec![Filter {
        name: "freeSearch".into(),
        columns: vec![f.username, f.webpage],
    }];
    let params = RequestParams::new().with("freeSearch", "bob");
    let rendered = QueryRenderer::new(&f.schema, Dialect::MySql)
        .render(&targets, &f.plan(&targets), &filters, &params, None)
        .unwrap();

    assert!(rendered.sql.ends_with("\nwhere (users.username = ?);"));
    assert_eq!(rendered.params, vec![json!("bob")]);
}

#[test]
fn test_active_filter_with_no_qualified_candidate_is_a_defect() {
    let f = fixture();
    let targets = vec![f.username];
    let filters = vec![Filter {
        name: "teamName".into(),
        columns: vec![f.team_name],
    }];
    let params = RequestParams::new().with("teamName", "platform");
    let err = QueryRenderer::new(&f.schema, Dialect::MySql)
        .render(&targets, &f.plan(&targets), &filters, &params, None)
        .unwrap_err();

    assert_eq!(
        err,
        RenderError::RenderingDefect {
            filter: "teamName".into()
        }
    );
}

#[test]
fn test_sort_clause() {
    let f = fixture();
    let targets = f.targets();
    let plan = f.plan(&targets);
    let renderer = QueryRenderer::new(&f.schema, Dialect::MySql);
    let params = RequestParams::new();

    let desc = SortSpec::new("username", SortDir::Desc);
    let sorted = renderer
        .render(&targets, &plan, &[], &params, Some(&desc))
        .unwrap();
    assert!(sorted.sql.ends_with("\norder by username desc;"));

    let unsorted = renderer.render(&targets, &plan, &[], &params, None).unwrap();
    assert!(!unsorted.sql.contains("order by"));

    let qualified = SortSpec::new("user_webpages.webpage", SortDir::Asc);
    let sorted = renderer
        .render(&targets, &plan, &[], &params, Some(&qualified))
        .unwrap();
    assert!(sorted.sql.ends_with("\norder by user_webpages.webpage asc;"));
}

#[test]
fn test_sort_column_is_escaped_not_interpolated() {
    let f = fixture();
    let targets = vec![f.username];
    let hostile = SortSpec::new("username; drop table users", SortDir::Asc);

    let mysql = QueryRenderer::new(&f.schema, Dialect::MySql)
        .render(&targets, &f.plan(&targets), &[], &RequestParams::new(), Some(&hostile))
        .unwrap();
    assert!(mysql
        .sql
        .ends_with("order by `username; drop table users` asc;"));

    let postgres = QueryRenderer::new(&f.schema, Dialect::Postgres)
        .render(&targets, &f.plan(&targets), &[], &RequestParams::new(), Some(&hostile))
        .unwrap();
    assert!(postgres
        .sql
        .ends_with("order by \"username; drop table users\" asc;"));
}

#[test]
fn test_rendering_is_idempotent() {
    let f = fixture();
    let targets = f.targets();
    let plan = f.plan(&targets);
    let params = RequestParams::new()
        .with("userId", 5)
        .with("freeSearch", "x")
        .with("sortColumn", "username");
    let sort = SortSpec::from_params(&params).unwrap();

    for dialect in Dialect::all() {
        let renderer = QueryRenderer::new(&f.schema, dialect);
        let first = renderer
            .render(&targets, &plan, &f.filters(), &params, sort.as_ref())
            .unwrap();
        let second = renderer
            .render(&targets, &plan, &f.filters(), &params, sort.as_ref())
            .unwrap();
        assert_eq!(first, second, "{dialect}");
    }
}

#[test]
fn test_rendered_sql_parses_in_every_dialect() {
    let f = fixture();
    let targets = vec![f.user_id, f.username, f.webpage, f.team_name];
    let plan = f.plan(&targets);
    let params = RequestParams::new()
        .with("userId", 5)
        .with("freeSearch", "x");
    let sort = SortSpec::new("team_name", SortDir::Desc);

    for dialect in Dialect::all() {
        let rendered = QueryRenderer::new(&f.schema, dialect)
            .render(&targets, &plan, &f.filters(), &params, Some(&sort))
            .unwrap();
        let parsed = match dialect {
            Dialect::MySql => Parser::parse_sql(&MySqlDialect {}, &rendered.sql),
            Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, &rendered.sql),
            Dialect::Sqlite => Parser::parse_sql(&SQLiteDialect {}, &rendered.sql),
            Dialect::DuckDb => Parser::parse_sql(&GenericDialect {}, &rendered.sql),
        };
        let statements = parsed.unwrap_or_else(|e| panic!("{dialect}: {e}\n{}", rendered.sql));
        assert_eq!(statements.len(), 1);
        assert_eq!(rendered.params.len(), 3);
    }
}

#[test]
fn test_placeholders_follow_dialect() {
    let f = fixture();
    let targets = f.targets();
    let plan = f.plan(&targets);
    let params = RequestParams::new().with("freeSearch", "x");

    let expected = [
        (Dialect::MySql, "(users.username = ? or user_webpages.webpage = ?)"),
        (Dialect::Postgres, "(users.username = $1 or user_webpages.webpage = $2)"),
        (Dialect::DuckDb, "(users.username = $1 or user_webpages.webpage = $2)"),
        (Dialect::Sqlite, "(users.username = ?1 or user_webpages.webpage = ?2)"),
    ];
    for (dialect, group) in expected {
        let rendered = QueryRenderer::new(&f.schema, dialect)
            .render(&targets, &plan, &f.filters(), &params, None)
            .unwrap();
        assert!(rendered.sql.contains(group), "{dialect}: {}", rendered.sql);
    }
}
