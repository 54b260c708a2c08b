use gatherer::model::{ColumnId, Schema, SourceId};
use gatherer::planner::{GreedyResolver, JoinResolver, JoinThrough, PlanError};

struct Users {
    schema: Schema,
    users: SourceId,
    pages: SourceId,
    user_id: ColumnId,
    username: ColumnId,
    webpage: ColumnId,
}

/// `users{user_id, username}` and `user_webpages{user_id, webpage}` sharing `user_id`.
fn users_schema() -> Users {
    let mut builder = Schema::builder();
    let users = builder.add_source("users").unwrap();
    let pages = builder.add_source("user_webpages").unwrap();
    let user_id = builder.add_column("user_id", &[users, pages]).unwrap();
    let username = builder.add_column("username", &[users]).unwrap();
    let webpage = builder.add_column("webpage", &[pages]).unwrap();
    Users {
        schema: builder.build().unwrap(),
        users,
        pages,
        user_id,
        username,
        webpage,
    }
}

#[test]
fn test_users_and_webpages_plan() {
    let s = users_schema();
    let plan = GreedyResolver
        .resolve(&s.schema, s.users, &[s.user_id, s.username, s.webpage])
        .unwrap();

    let sources: Vec<_> = plan.tables().iter().map(|t| t.source).collect();
    assert_eq!(sources, vec![s.users, s.pages]);

    assert_eq!(plan.origin().columns, vec![s.user_id, s.username]);
    assert_eq!(plan.origin().join, None);

    let pages = &plan.joins()[0];
    assert_eq!(pages.columns, vec![s.webpage]);
    assert_eq!(
        pages.join,
        Some(JoinThrough {
            through_source: s.users,
            through_column: s.user_id,
        })
    );
}

#[test]
fn test_non_origin_column_alone_joins_through_shared_key() {
    let s = users_schema();
    let plan = GreedyResolver
        .resolve(&s.schema, s.users, &[s.webpage])
        .unwrap();

    assert_eq!(plan.len(), 2);
    assert!(plan.origin().columns.is_empty());
    assert_eq!(plan.assignment(s.webpage).unwrap().source, s.pages);
}

#[test]
fn test_separately_declared_keys_are_unjoinable() {
    let mut builder = Schema::builder();
    let users = builder.add_source("users").unwrap();
    let pages = builder.add_source("user_webpages").unwrap();
    builder.add_keyed_column("UsersUserId", "user_id", &[users]).unwrap();
    builder.add_keyed_column("PagesUserId", "user_id", &[pages]).unwrap();
    let webpage = builder.add_column("webpage", &[pages]).unwrap();
    let schema = builder.build().unwrap();

    let err = GreedyResolver.resolve(&schema, users, &[webpage]).unwrap_err();
    assert_eq!(
        err,
        PlanError::UnjoinableColumn {
            column: "webpage".into(),
            sources: vec!["user_webpages".into()],
        }
    );
}

#[test]
fn test_every_target_assigned_exactly_once() {
    let s = users_schema();
    let requested = [s.webpage, s.user_id, s.username, s.webpage, s.user_id];
    let plan = GreedyResolver
        .resolve(&s.schema, s.users, &requested)
        .unwrap();

    for column in [s.user_id, s.username, s.webpage] {
        let holders = plan
            .tables()
            .iter()
            .filter(|t| t.columns.contains(&column))
            .count();
        assert_eq!(holders, 1, "{column}");
    }
}

#[test]
fn test_no_source_appears_twice() {
    let mut builder = Schema::builder();
    let orders = builder.add_source("orders").unwrap();
    let items = builder.add_source("order_items").unwrap();
    let order_id = builder.add_column("order_id", &[orders, items]).unwrap();
    let sku = builder.add_column("sku", &[items]).unwrap();
    let quantity = builder.add_column("quantity", &[items]).unwrap();
    let schema = builder.build().unwrap();

    let plan = GreedyResolver
        .resolve(&schema, orders, &[sku, order_id, quantity])
        .unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.joins()[0].columns, vec![sku, quantity]);
    // order_id lives in both; the origin was joined first.
    assert_eq!(plan.assignment(order_id).unwrap().source, orders);
}

#[test]
fn test_only_reachable_through_unrequested_table_fails() {
    let mut builder = Schema::builder();
    let orders = builder.add_source("orders").unwrap();
    let customers = builder.add_source("customers").unwrap();
    let regions = builder.add_source("regions").unwrap();
    builder.add_column("customer_id", &[orders, customers]).unwrap();
    let customer_name = builder.add_column("customer_name", &[customers]).unwrap();
    builder.add_column("region_id", &[customers, regions]).unwrap();
    let region_name = builder.add_column("region_name", &[regions]).unwrap();
    let schema = builder.build().unwrap();

    // No multi-hop search.
    let err = GreedyResolver
        .resolve(&schema, orders, &[region_name])
        .unwrap_err();
    assert!(matches!(err, PlanError::UnjoinableColumn { ref column, .. } if column == "region_name"));

    // Requesting the intermediate first makes the chain resolvable.
    let plan = GreedyResolver
        .resolve(&schema, orders, &[customer_name, region_name])
        .unwrap();
    let sources: Vec<_> = plan.tables().iter().map(|t| t.source).collect();
    assert_eq!(sources, vec![orders, customers, regions]);
    assert_eq!(
        plan.joins()[1].join.unwrap().through_source,
        customers
    );
}

#[test]
fn test_first_joined_table_wins_the_search() {
    // Both `a` and `b` could pull in `c`; `a` was discovered first.
    let mut builder = Schema::builder();
    let origin = builder.add_source("origin").unwrap();
    let a = builder.add_source("a").unwrap();
    let b = builder.add_source("b").unwrap();
    let c = builder.add_source("c").unwrap();
    builder.add_column("oa", &[origin, a]).unwrap();
    builder.add_column("ob", &[origin, b]).unwrap();
    let a_val = builder.add_column("a_val", &[a]).unwrap();
    let b_val = builder.add_column("b_val", &[b]).unwrap();
    let ac = builder.add_column("ac", &[a, c]).unwrap();
    builder.add_column("bc", &[b, c]).unwrap();
    let c_val = builder.add_column("c_val", &[c]).unwrap();
    let schema = builder.build().unwrap();

    let plan = GreedyResolver
        .resolve(&schema, origin, &[a_val, b_val, c_val])
        .unwrap();
    assert_eq!(
        plan.table_for(c).unwrap().join,
        Some(JoinThrough {
            through_source: a,
            through_column: ac,
        })
    );
}

#[test]
fn test_resolution_is_deterministic() {
    let s = users_schema();
    let requested = [s.username, s.webpage];
    let first = GreedyResolver.resolve(&s.schema, s.users, &requested).unwrap();
    let second = GreedyResolver.resolve(&s.schema, s.users, &requested).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_unknown_origin_and_column() {
    let s = users_schema();

    let mut other = Schema::builder();
    for name in ["a", "b", "c"] {
        other.add_source(name).unwrap();
    }
    let stray_source = other.add_source("d").unwrap();
    let mut stray_columns = Vec::new();
    for name in ["w", "x", "y", "z"] {
        stray_columns.push(other.add_column(name, &[stray_source]).unwrap());
    }

    assert!(matches!(
        GreedyResolver.resolve(&s.schema, stray_source, &[s.user_id]),
        Err(PlanError::UnknownSource(_))
    ));
    assert!(matches!(
        GreedyResolver.resolve(&s.schema, s.users, &[stray_columns[3]]),
        Err(PlanError::UnknownColumn(_))
    ));
}
