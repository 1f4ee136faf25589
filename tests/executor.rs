//! Action semantics against documents on disk.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use smock::actions::{ActionError, Executor, Query};
use smock::codec::CodecRegistry;
use smock::config::RouteConfig;
use smock::routing::Route;

mod common;

fn build(root: &Path, config: RouteConfig) -> Route {
    Route::from_config(&config, root, &CodecRegistry::default()).unwrap()
}

fn users_route(root: &Path, method: &str, action: &str) -> Route {
    build(
        root,
        RouteConfig {
            path: "/users".into(),
            method: method.into(),
            action: action.into(),
            id: vec!["id".into()],
            ..Default::default()
        },
    )
}

async fn run(executor: &Executor, route: &Route, query: &str, body: Value) -> Result<Value, ActionError> {
    let body = if body.is_null() {
        Vec::new()
    } else {
        serde_json::to_vec(&body).unwrap()
    };
    let reply = executor
        .execute(route, &Query::parse(Some(query)), &body)
        .await?;
    assert_eq!(reply.content_type, "application/json");
    Ok(serde_json::from_slice(&reply.body).unwrap())
}

#[tokio::test]
async fn test_read_is_idempotent() {
    let root = tempfile::tempdir().unwrap();
    common::write_document(
        root.path(),
        "users.json",
        json!({"data": [{"id": "1", "name": "ada"}, {"id": "2", "name": "bob"}]}),
    );
    let before = std::fs::read(root.path().join("users.json")).unwrap();

    let executor = Executor::default();
    let route = users_route(root.path(), "GET", "");
    let first = run(&executor, &route, "", Value::Null).await.unwrap();
    let second = run(&executor, &route, "", Value::Null).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.as_array().unwrap().len(), 2);
    assert_eq!(std::fs::read(root.path().join("users.json")).unwrap(), before);
}

#[tokio::test]
async fn test_read_missing_document_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::default();
    let route = users_route(root.path(), "GET", "");

    let result = run(&executor, &route, "", Value::Null).await;
    assert!(matches!(result, Err(ActionError::NotFound)));
    assert!(!root.path().join("users.json").exists());
}

#[tokio::test]
async fn test_read_filters_and_projects() {
    let root = tempfile::tempdir().unwrap();
    common::write_document(
        root.path(),
        "users.json",
        json!({"data": [
            {"id": "1", "name": "ada", "secret": "x"},
            {"id": "2", "name": "bob", "secret": "y"},
            {"id": "3", "name": "cy", "secret": "z", "age": 3}
        ]}),
    );

    let executor = Executor::default();
    let route = build(
        root.path(),
        RouteConfig {
            path: "/users".into(),
            fields: vec!["id".into(), "name".into()],
            ..Default::default()
        },
    );

    let value = run(&executor, &route, "id=1&id=3", Value::Null).await.unwrap();
    assert_eq!(
        value,
        json!([{"id": "1", "name": "ada"}, {"id": "3", "name": "cy"}])
    );

    // Only textual fields take part in matching.
    let value = run(&executor, &route, "age=3", Value::Null).await.unwrap();
    assert_eq!(value, json!([]));
}

#[tokio::test]
async fn test_read_collapses_single_match() {
    let root = tempfile::tempdir().unwrap();
    common::write_document(
        root.path(),
        "users.json",
        json!({"data": [{"id": "1"}, {"id": "2"}]}),
    );

    let executor = Executor::default();
    let route = build(
        root.path(),
        RouteConfig {
            path: "/users".into(),
            unique_not_list: true,
            ..Default::default()
        },
    );

    let one = run(&executor, &route, "id=2", Value::Null).await.unwrap();
    assert_eq!(one, json!({"id": "2"}));

    let many = run(&executor, &route, "", Value::Null).await.unwrap();
    assert_eq!(many, json!([{"id": "1"}, {"id": "2"}]));
}

#[tokio::test]
async fn test_read_single_returns_datum() {
    let root = tempfile::tempdir().unwrap();
    common::write_document(
        root.path(),
        "profile.json",
        json!({"datum": {"name": "ada"}, "data": [{"ignored": "yes"}]}),
    );

    let executor = Executor::default();
    let route = build(
        root.path(),
        RouteConfig {
            path: "/profile".into(),
            single: true,
            ..Default::default()
        },
    );

    let value = run(&executor, &route, "", Value::Null).await.unwrap();
    assert_eq!(value, json!({"name": "ada"}));
}

#[tokio::test]
async fn test_write_replaces_datum() {
    let root = tempfile::tempdir().unwrap();
    common::write_document(
        root.path(),
        "profile.json",
        json!({"datum": {"name": "ada", "old": "field"}, "post_response": {"saved": "yes"}}),
    );

    let executor = Executor::default();
    let route = build(
        root.path(),
        RouteConfig {
            path: "/profile".into(),
            method: "PUT".into(),
            action: "w".into(),
            single: true,
            ..Default::default()
        },
    );

    let value = run(&executor, &route, "", json!({"name": "bob"})).await.unwrap();
    assert_eq!(value, json!({"saved": "yes"}));

    let document = common::read_document(root.path(), "profile.json");
    assert_eq!(document["datum"], json!({"name": "bob"}));
    assert_eq!(document["post_response"], json!({"saved": "yes"}));
}

#[tokio::test]
async fn test_write_builds_datum_from_query() {
    let root = tempfile::tempdir().unwrap();
    common::write_document(
        root.path(),
        "profile.json",
        json!({"datum": {"old": "gone"}, "post_response": {"saved": "yes"}, "del_response": {"deleted": "yes"}}),
    );

    let executor = Executor::default();
    let single = |method: &str, action: &str| {
        build(
            root.path(),
            RouteConfig {
                path: "/profile".into(),
                method: method.into(),
                action: action.into(),
                single: true,
                ..Default::default()
            },
        )
    };

    let value = run(&executor, &single("GET", "w"), "a=1&t=x&t=y", Value::Null).await.unwrap();
    assert_eq!(value, json!({"saved": "yes"}));
    let expected = json!({"a": "1", "t": ["x", "y"]});
    assert_eq!(common::read_document(root.path(), "profile.json")["datum"], expected);

    let read = run(&executor, &single("GET", "r"), "", Value::Null).await.unwrap();
    assert_eq!(read, expected);

    // A delete-method write still answers with the write response.
    let value = run(&executor, &single("DELETE", "w"), "b=2", Value::Null).await.unwrap();
    assert_eq!(value, json!({"saved": "yes"}));
    assert_eq!(
        common::read_document(root.path(), "profile.json")["datum"],
        json!({"b": "2"})
    );
}

#[tokio::test]
async fn test_missing_reads_leave_no_lock_entries() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::default();

    for i in 0..200 {
        let route = users_route(root.path(), "GET", "");
        let route = Route {
            file: root.path().join(format!("missing{}.json", i)),
            ..route
        };
        let result = run(&executor, &route, "", Value::Null).await;
        assert!(matches!(result, Err(ActionError::NotFound)));
    }

    assert!(executor.store().locks().is_empty());
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_write_replaces_collection() {
    let root = tempfile::tempdir().unwrap();
    common::write_document(root.path(), "users.json", json!({"data": [{"id": "old"}]}));

    let executor = Executor::default();
    let route = users_route(root.path(), "POST", "write");

    let value = run(&executor, &route, "", json!([{"id": "a"}, {"id": "b"}])).await.unwrap();
    assert_eq!(value, json!({"success": true}));

    let document = common::read_document(root.path(), "users.json");
    assert_eq!(document["data"], json!([{"id": "a"}, {"id": "b"}]));
}

#[tokio::test]
async fn test_append_creates_missing_document() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::default();
    let route = build(
        root.path(),
        RouteConfig {
            path: "/teams/users".into(),
            method: "POST".into(),
            ..Default::default()
        },
    );

    run(&executor, &route, "", json!({"id": "1"})).await.unwrap();

    let document = common::read_document(root.path(), "teams/users.json");
    assert_eq!(document["data"], json!([{"id": "1"}]));
}

#[tokio::test]
async fn test_append_rejects_duplicate_id() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::default();
    let route = users_route(root.path(), "POST", "append");

    run(&executor, &route, "", json!({"id": "1", "name": "ada"})).await.unwrap();
    let second = run(&executor, &route, "", json!({"id": "1", "name": "other"})).await;
    assert!(matches!(second, Err(ActionError::Conflict { .. })));

    run(&executor, &route, "", json!({"id": "2", "name": "bob"})).await.unwrap();

    let document = common::read_document(root.path(), "users.json");
    assert_eq!(
        document["data"],
        json!([{"id": "1", "name": "ada"}, {"id": "2", "name": "bob"}])
    );
}

#[tokio::test]
async fn test_append_from_query_on_get() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::default();
    let route = users_route(root.path(), "GET", "append");

    run(&executor, &route, "id=9&tag=a&tag=b", Value::Null).await.unwrap();

    let document = common::read_document(root.path(), "users.json");
    assert_eq!(document["data"], json!([{"id": "9", "tag": ["a", "b"]}]));
}

#[tokio::test]
async fn test_delete_removes_matching_records() {
    let root = tempfile::tempdir().unwrap();
    common::write_document(
        root.path(),
        "users.json",
        json!({
            "del_response": {"deleted": "ok"},
            "data": [
                {"id": "1", "color": "red"},
                {"id": "2", "color": "blue"},
                {"id": "3", "color": "red"}
            ]
        }),
    );

    let executor = Executor::default();
    let route = users_route(root.path(), "DELETE", "");

    let value = run(&executor, &route, "color=red", Value::Null).await.unwrap();
    assert_eq!(value, json!({"deleted": "ok"}));

    let document = common::read_document(root.path(), "users.json");
    assert_eq!(document["data"], json!([{"id": "2", "color": "blue"}]));
}

#[tokio::test]
async fn test_delete_without_query_keeps_records() {
    let root = tempfile::tempdir().unwrap();
    common::write_document(root.path(), "users.json", json!({"data": [{"id": "1"}]}));
    let before = std::fs::read(root.path().join("users.json")).unwrap();

    let executor = Executor::default();
    let route = users_route(root.path(), "DELETE", "");

    let value = run(&executor, &route, "", Value::Null).await.unwrap();
    assert_eq!(value, json!({"success": true}));
    assert_eq!(std::fs::read(root.path().join("users.json")).unwrap(), before);
}

#[tokio::test]
async fn test_malformed_document_is_left_untouched() {
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("users.json"), b"{not json").unwrap();

    let executor = Executor::default();
    let route = users_route(root.path(), "POST", "append");

    let result = run(&executor, &route, "", json!({"id": "1"})).await;
    assert!(matches!(result, Err(ActionError::Store(_))));
    assert_eq!(std::fs::read(root.path().join("users.json")).unwrap(), b"{not json");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends_keep_every_record() {
    let root = tempfile::tempdir().unwrap();
    let executor = Executor::default();
    let route = Arc::new(users_route(root.path(), "POST", "append"));

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let executor = executor.clone();
            let route = route.clone();
            tokio::spawn(async move {
                let body = serde_json::to_vec(&json!({"id": i.to_string()})).unwrap();
                executor.execute(&route, &Query::new(), &body).await
            })
        })
        .collect();

    for result in futures_util::future::join_all(handles).await {
        assert!(result.unwrap().is_ok());
    }

    let document = common::read_document(root.path(), "users.json");
    assert_eq!(document["data"].as_array().unwrap().len(), 32);
    assert!(executor.store().locks().is_empty());
}
