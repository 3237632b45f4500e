//! Client scenarios: query definitions, both delivery modes and configuration.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use sqlq_client::{
    Client, Config, Error, ParamSpec, QueryDefinition, ResultSet, Rows, SqlValue, Values, callback,
};
use sqlq_pool::{PoolError, SessionConfig};
use sqlq_testing::{MockTransport, Outcome, init_tracing, rows};
use sqlq_types::SqlType;
use tokio::sync::mpsc;

fn client(transport: &MockTransport) -> Client<MockTransport> {
    let config = Config::new("db.test").credentials("app", "secret");
    let client = Client::new(&config, transport.clone()).unwrap();
    client.start();
    client
}

fn values(pairs: &[(&str, SqlValue)]) -> Values {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), value.clone()))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_callback_query_binds_and_delivers_unflattened() {
    init_tracing();
    let transport = MockTransport::new();
    let sql = "SELECT id, name FROM users WHERE id = @id";
    transport.script(sql, [Outcome::Rows(rows([[("id", SqlValue::from(7))]]))]);
    let client = client(&transport);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let query = client
        .define_query(sql, &[ParamSpec::new("id", "int")], move |result| {
            let _ = tx.send(result);
        })
        .unwrap();

    query.call(&values(&[("id", SqlValue::from(7))]));

    let set: ResultSet = rx.recv().await.unwrap().unwrap();
    assert_eq!(set.row_count, 1);
    assert_eq!(set.rows[0].get("id").unwrap().value, SqlValue::Int(7));

    let run = &transport.executions_of(sql)[0];
    assert_eq!(run.params.len(), 1);
    assert_eq!(run.params[0].sql_type, SqlType::Int);
    assert_eq!(run.params[0].value, SqlValue::Int(7));
    client.exit();
}

#[tokio::test(start_paused = true)]
async fn test_callback_override_replaces_default() {
    init_tracing();
    let transport = MockTransport::new();
    let client = client(&transport);

    let defaults = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&defaults);
    let query = client
        .define_query("UPDATE t SET x = 1", &[], move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    query.call_with(
        &Values::new(),
        callback(move |result| {
            let _ = tx.send(result.map(|set| set.row_count));
        }),
    );

    assert_eq!(rx.recv().await.unwrap().unwrap(), 1);
    assert_eq!(defaults.load(Ordering::SeqCst), 0);
    client.exit();
}

#[tokio::test(start_paused = true)]
async fn test_future_query_flattens() {
    init_tracing();
    let transport = MockTransport::new();
    let sql = "SELECT col FROM t";
    transport.script(
        sql,
        [
            Outcome::Rows(rows([[("col", 5)]])),
            Outcome::Rows(rows([[("col", 5)]])),
        ],
    );
    let client = client(&transport);

    let flat = client.define_future_query(sql, &[], true).unwrap();
    let rows = flat.call(&Values::new()).await.unwrap();
    assert_eq!(serde_json::to_value(&rows).unwrap(), serde_json::json!([{ "col": 5 }]));

    let native = client.define_future_query(sql, &[], false).unwrap();
    match native.call(&Values::new()).await.unwrap() {
        Rows::Native(rows) => assert_eq!(rows[0].get("col").unwrap().value, SqlValue::Int(5)),
        other => panic!("expected native rows, got {other:?}"),
    }
    client.exit();
}

#[tokio::test(start_paused = true)]
async fn test_future_query_zero_rows_is_empty() {
    init_tracing();
    let transport = MockTransport::new();
    let sql = "DELETE FROM t WHERE 1 = 0";
    let mut set = rows([[("col", 5)]]);
    set.row_count = 0;
    transport.script(sql, [Outcome::Rows(set.clone()), Outcome::Rows(set)]);
    let client = client(&transport);

    for flatten in [true, false] {
        let query = client.define_future_query(sql, &[], flatten).unwrap();
        assert!(query.call(&Values::new()).await.unwrap().is_empty());
    }
    client.exit();
}

#[tokio::test(start_paused = true)]
async fn test_future_query_rejects_terminal_error() {
    init_tracing();
    let transport = MockTransport::new();
    transport.script("SELECT bad", [Outcome::server_error("Incorrect syntax near 'bad'.")]);
    let client = client(&transport);

    let query = client.define_future_query("SELECT bad", &[], false).unwrap();
    let err = query.call(&Values::new()).await.unwrap_err();
    assert!(matches!(err, Error::Pool(PoolError::Driver(_))));
    client.exit();
}

#[tokio::test(start_paused = true)]
async fn test_future_query_hides_transient_failures() {
    init_tracing();
    let transport = MockTransport::new();
    transport.script(
        "SELECT 1",
        [Outcome::timeout(), Outcome::SocketDrop, Outcome::affected(1)],
    );
    let client = client(&transport);

    let query = client.define_future_query("SELECT 1", &[], false).unwrap();
    let rows = query.call(&Values::new()).await.unwrap();
    assert!(rows.is_empty());
    assert_eq!(transport.executions_of("SELECT 1").len(), 3);
    client.exit();
}

#[tokio::test]
async fn test_future_query_enqueues_eagerly() {
    let transport = MockTransport::new();
    let config = Config::new("db.test");
    let client = Client::new(&config, transport).unwrap();

    let query = client.define_future_query("SELECT 1", &[], false).unwrap();
    let pending = query.call(&Values::new());
    assert_eq!(client.pool().queued(), vec![pending.job_id()]);

    client.exit();
    assert!(matches!(pending.await, Err(Error::Pool(PoolError::Closed))));
}

#[tokio::test]
async fn test_unknown_type_is_rejected_before_queueing() {
    let transport = MockTransport::new();
    let client = Client::new(&Config::new("db.test"), transport).unwrap();

    let err = client
        .define_query("SELECT @x", &[ParamSpec::new("x", "integer")], |_| {})
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(err, Error::Param { ref param, .. } if param == "x"));

    assert!(
        client
            .define_future_query("SELECT @x", &[ParamSpec::new("x", "Strin")], true)
            .is_err()
    );
    assert_eq!(client.metrics().jobs_submitted, 0);
}

#[tokio::test(start_paused = true)]
async fn test_exec_passthrough() {
    init_tracing();
    let transport = MockTransport::new();
    transport.script("TRUNCATE TABLE t", [Outcome::affected(0)]);
    let client = client(&transport);

    let (tx, mut rx) = mpsc::unbounded_channel();
    client.exec("TRUNCATE TABLE t", move |result| {
        let _ = tx.send(result);
    });

    assert_eq!(rx.recv().await.unwrap().unwrap().row_count, 0);
    assert!(transport.executions_of("TRUNCATE TABLE t")[0].params.is_empty());
    client.exit();
}

#[tokio::test(start_paused = true)]
async fn test_define_queries_batch() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("orders.sql");
    std::fs::write(&file, "SELECT * FROM orders WHERE id = @id").unwrap();

    let transport = MockTransport::new();
    let client = client(&transport);

    let queries = client
        .define_queries([
            QueryDefinition::new("ping", "SELECT 1"),
            QueryDefinition::from_file("order", &file)
                .param(ParamSpec::new("id", "BigInt"))
                .future(true),
        ])
        .unwrap();

    assert_eq!(queries.len(), 2);
    assert!(!queries["ping"].is_future());

    let order = queries["order"].as_future().unwrap();
    assert!(order.flattens());
    order.call(&values(&[("id", SqlValue::from(1))])).await.unwrap();

    let runs = transport.executions_of("SELECT * FROM orders WHERE id = @id");
    assert_eq!(runs[0].params[0].sql_type, SqlType::BigInt);
    client.exit();
}

#[tokio::test]
async fn test_define_queries_rejects_duplicates_and_missing_sql() {
    let client = Client::new(&Config::new("db.test"), MockTransport::new()).unwrap();

    let err = client
        .define_queries([
            QueryDefinition::new("a", "SELECT 1"),
            QueryDefinition::new("a", "SELECT 2"),
        ])
        .unwrap_err();
    assert!(matches!(err, Error::Definition { ref id, .. } if id == "a"));

    let err = client
        .define_queries([QueryDefinition::from_file("b", "/nonexistent/b.sql")])
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_load_definitions_from_json() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("count.sql"), "SELECT COUNT(*) AS n FROM users").unwrap();
    std::fs::write(
        dir.path().join("queries.json"),
        r#"[
            {"id": "count", "file": "count.sql", "usePromise": true, "flatten": true},
            {"id": "rename", "sql": "UPDATE users SET name = @name WHERE id = @id",
             "params": [
                {"name": "name", "type": "nvarchar", "options": {"length": 100}},
                {"name": "id", "type": "Int"}
             ]}
        ]"#,
    )
    .unwrap();

    let transport = MockTransport::new();
    transport.script(
        "SELECT COUNT(*) AS n FROM users",
        [Outcome::Rows(rows([[("n", 3)]]))],
    );
    let client = client(&transport);

    let queries = client.load_definitions(dir.path().join("queries.json")).unwrap();
    let count = queries["count"].as_future().unwrap();
    let rows = count.call(&Values::new()).await.unwrap().into_flat();
    assert_eq!(rows[0].get("n"), Some(&SqlValue::Int(3)));

    let rename = queries["rename"].as_callback().unwrap();
    assert_eq!(rename.query().param_count(), 2);

    let missing = client.load_definitions(dir.path().join("missing.json"));
    assert!(matches!(missing, Err(Error::Io { .. })));
    client.exit();
}

#[tokio::test(start_paused = true)]
async fn test_obfuscated_config_reaches_transport_decoded() {
    init_tracing();
    let config = Config::from_json(
        r#"{
            "server": "data:ZGIuaW50ZXJuYWw=",
            "authentication": {
                "type": "default",
                "options": { "userName": "data:YXBw", "password": "data:c2VjcmV0" }
            },
            "options": { "database": "orders" }
        }"#,
    )
    .unwrap();

    let transport = MockTransport::new();
    let client = Client::new(&config, transport.clone()).unwrap();
    client.start();

    let (tx, mut rx) = mpsc::unbounded_channel();
    client.exec("SELECT 1", move |result| {
        let _ = tx.send(result.is_ok());
    });
    assert!(rx.recv().await.unwrap());

    let seen: SessionConfig = transport.configs()[0].clone();
    assert_eq!(seen.server, "db.internal");
    assert_eq!(seen.user_name, "app");
    assert_eq!(seen.password, "secret");
    assert_eq!(seen.options["database"], "orders");
    client.exit();
}

#[test]
fn test_bad_obfuscated_config_fails_client_creation() {
    let config = Config::new("data:%%%");
    let err = Client::new(&config, MockTransport::new()).unwrap_err();
    assert!(matches!(err, Error::Decode { field: "server", .. }));
}
