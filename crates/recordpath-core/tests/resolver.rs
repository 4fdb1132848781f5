//! End-to-end scenarios for the record field resolver, exercised through
//! its public API only: construct a resolver, resolve one or more
//! paths, apply the accumulated joins to a `SelectQuery`, and check the
//! rendered SQL text.

use pretty_assertions::assert_eq;
use recordpath_core::{AuthRecord, Collection, Field, InMemoryDao, RecordFieldResolver, RequestData};
use recordpath_sql::SelectQuery;
use serde_json::json;
use tracing_subscriber::fmt::TestWriter;

fn demo4() -> Collection {
    Collection::new("demo4_id", "demo4", false)
        .with_field(Field::scalar("title"))
        .with_field(Field::relation("self_rel_one", "demo4_id", Some(1)))
        .with_field(Field::relation("self_rel_many", "demo4_id", None))
}

fn demo1() -> Collection {
    Collection::new("demo1_id", "demo1", false)
        .with_field(Field::scalar("text"))
        .with_field(Field::scalar("file_one"))
}

fn demo2() -> Collection {
    Collection::new("demo2_id", "demo2", false).with_field(Field::scalar("active"))
}

fn users() -> Collection {
    Collection::new("_pb_users", "users", true)
}

/// `title` on the base collection: a bare column reference, no joins.
#[test]
fn scenario_1_plain_field() {
    let dao = InMemoryDao::new().with_collection(demo4());
    let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
    let result = resolver.resolve("title").unwrap();
    assert_eq!(result.identifier, "[[demo4.title]]");

    let mut query = SelectQuery::new("demo4").select_all();
    resolver.update_query(&mut query).unwrap();
    let sql = query.where_raw(format!("{} > 1", result.identifier)).build();
    assert_eq!(sql, "SELECT `demo4`.* FROM `demo4` WHERE [[demo4.title]] > 1");
}

/// `self_rel_one.title`: a single-valued hop, one json_each + one table
/// join, DISTINCT set, no multi-match subquery.
#[test]
fn scenario_2_single_relation_hop() {
    let dao = InMemoryDao::new().with_collection(demo4());
    let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
    let result = resolver.resolve("self_rel_one.title").unwrap();
    assert_eq!(result.identifier, "[[demo4_self_rel_one.title]]");
    assert!(result.multi_match_subquery.is_none());

    let mut query = SelectQuery::new("demo4").select_all();
    resolver.update_query(&mut query).unwrap();
    assert!(query.is_distinct());
    let sql = query.where_raw(format!("{} > 1", result.identifier)).build();
    assert!(sql.contains("LEFT JOIN json_each(CASE WHEN json_valid([[demo4.self_rel_one]])"));
    assert!(sql.contains("LEFT JOIN `demo4` `demo4_self_rel_one` ON [[demo4_self_rel_one.id]] = [[demo4_self_rel_one_je.value]]"));
    assert!(sql.ends_with("WHERE [[demo4_self_rel_one.title]] > 1"));
}

/// `self_rel_many.self_rel_one.self_rel_many.self_rel_one.title`: four
/// nested json_each+table join pairs with compounded aliases.
#[test]
fn scenario_3_nested_relation_chain() {
    let dao = InMemoryDao::new().with_collection(demo4());
    let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
    let result = resolver
        .resolve("self_rel_many.self_rel_one.self_rel_many.self_rel_one.title")
        .unwrap();
    assert_eq!(
        result.identifier,
        "[[demo4_self_rel_many_self_rel_one_self_rel_many_self_rel_one.title]]"
    );
    assert_eq!(resolver.joins().len(), 8);
    // Crossed a multi-valued hop (self_rel_many), so the mirror is active.
    let mm = result.multi_match_subquery.unwrap();
    assert_eq!(mm.joins.len(), 8);
    assert_eq!(
        mm.value_identifier,
        "[[__mm_demo4_self_rel_many_self_rel_one_self_rel_many_self_rel_one.title]]"
    );
}

/// `@collection.demo1.text || @collection.demo2.active || @collection.demo1.file_one`:
/// two `@collection` joins without an `on` clause, re-resolving demo1
/// doesn't grow the join list.
#[test]
fn scenario_4_collection_root_or_expression() {
    let dao = InMemoryDao::new()
        .with_collection(demo4())
        .with_collection(demo1())
        .with_collection(demo2());
    let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);

    let a = resolver.resolve("@collection.demo1.text").unwrap();
    let b = resolver.resolve("@collection.demo2.active").unwrap();
    let c = resolver.resolve("@collection.demo1.file_one").unwrap();

    assert_eq!(resolver.joins().len(), 2);
    for join in resolver.joins().iter() {
        assert!(join.on.is_none());
    }

    let expr = format!(
        "({} > 1 OR {} > 1 OR {} > 1)",
        a.identifier, b.identifier, c.identifier
    );
    assert_eq!(
        expr,
        "([[__collection_demo1.text]] > 1 OR [[__collection_demo2.active]] > 1 OR [[__collection_demo1.file_one]] > 1)"
    );
}

/// `@request.data.a.isset || @request.data.c.isset` given `data={a: null, b: 123}`.
#[test]
fn scenario_5_isset_pair() {
    let dao = InMemoryDao::new().with_collection(demo4());
    let data = json!({"a": null, "b": 123}).as_object().unwrap().clone();
    let request = RequestData::new("GET").with_data(data);
    let mut resolver = RecordFieldResolver::new(&dao, demo4(), Some(request), false);

    let a = resolver.resolve("@request.data.a.isset").unwrap();
    let c = resolver.resolve("@request.data.c.isset").unwrap();
    let expr = format!("({} > 1 OR {} > 1)", a.identifier, c.identifier);
    assert_eq!(expr, "(TRUE > 1 OR FALSE > 1)");
}

/// `email` on the `users` auth collection, with the hidden-field guard
/// toggled on and off.
#[test]
fn scenario_6_email_visibility_guard() {
    let dao = InMemoryDao::new().with_collection(users());

    let mut resolver = RecordFieldResolver::new(&dao, users(), None, false);
    let result = resolver.resolve("email").unwrap();
    let expr = result.build_expr(&format!("{} > 1", result.identifier));
    assert_eq!(
        format!("WHERE ({})", expr),
        "WHERE (([[users.email]] > 1) AND ([[users.emailVisibility]] = TRUE))"
    );

    let mut resolver = RecordFieldResolver::new(&dao, users(), None, true);
    let result = resolver.resolve("email").unwrap();
    let expr = result.build_expr(&format!("{} > 1", result.identifier));
    assert_eq!(format!("WHERE {}", expr), "WHERE [[users.email]] > 1");
}

/// `@request.auth.email` served from the snapshotted public export,
/// independent of the live record's visibility flag.
#[test]
fn request_auth_simple_field_served_from_snapshot() {
    let dao = InMemoryDao::new().with_collection(demo4());
    let mut export = serde_json::Map::new();
    export.insert("email".into(), json!("person@example.com"));
    export.insert("verified".into(), json!(true));
    let auth = AuthRecord::new("rec1", users(), export);
    let request = RequestData::new("GET").with_auth(auth);

    let mut resolver = RecordFieldResolver::new(&dao, demo4(), Some(request), false);
    let result = resolver.resolve("@request.auth.email").unwrap();
    assert_eq!(result.params.get("f0"), Some(&recordpath_sql::SqlParam::Text("person@example.com".into())));
}

/// `tracing`-subscriber smoke test: resolver construction and `resolve`
/// calls emit at least one event/span, rather than writing to stdout.
#[test]
fn tracing_smoke_test() {
    let subscriber = tracing_subscriber::fmt().with_writer(TestWriter::default()).finish();
    tracing::subscriber::with_default(subscriber, || {
        let dao = InMemoryDao::new().with_collection(demo4());
        let mut resolver = RecordFieldResolver::new(&dao, demo4(), None, false);
        resolver.resolve("title").unwrap();
    });
}
