//! End-to-end tests against an in-memory SQLite database.
//!
//! Every statement goes through the executor, so these check that the
//! classifier picks a driver path SQLite accepts and that values come back
//! materialized.

use pretty_assertions::assert_eq;
use rowscope::classify::Dialect;
use rowscope::config::{ConnectionConfig, QueryConfig, SQLITE_MEMORY};
use rowscope::db::{self, DatabaseClient, QueryResult};
use rowscope::error::Result;
use rowscope::output;
use rowscope::query::QueryExecutor;
use tokio_util::sync::CancellationToken;

async fn memory_client() -> Box<dyn DatabaseClient> {
    db::connect(&ConnectionConfig::sqlite(SQLITE_MEMORY))
        .await
        .unwrap()
}

async fn run(executor: &QueryExecutor<'_>, sql: &str) -> Result<QueryResult> {
    executor.run(sql, &CancellationToken::new()).await
}

async fn seed(executor: &QueryExecutor<'_>) {
    run(
        executor,
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, avatar BLOB, created DATETIME)",
    )
    .await
    .unwrap();
    let result = run(
        executor,
        "INSERT INTO users (name, avatar, created) VALUES \
         ('alice', x'deadbeef', '2024-01-15 12:00:00'), \
         ('bob', CAST('hello' AS BLOB), NULL)",
    )
    .await
    .unwrap();
    assert_eq!(result.message, "2 row(s) affected");
}

#[tokio::test]
async fn test_select_materializes_values() {
    let client = memory_client().await;
    assert_eq!(client.dialect(), Dialect::Sqlite);
    let executor = QueryExecutor::new(client.as_ref(), &QueryConfig::default());
    seed(&executor).await;

    let result = run(&executor, "SELECT id, name, avatar, created FROM users ORDER BY id")
        .await
        .unwrap();

    assert_eq!(result.columns, ["id", "name", "avatar", "created"]);
    assert_eq!(
        result.rows,
        vec![
            vec!["1", "alice", "deadbeef", "2024-01-15T12:00:00Z"],
            vec!["2", "bob", "hello", "NULL"],
        ]
    );
    assert_eq!(result.message, "2 row(s) returned");
}

#[tokio::test]
async fn test_returning_goes_through_row_path() {
    let client = memory_client().await;
    let executor = QueryExecutor::new(client.as_ref(), &QueryConfig::default());
    seed(&executor).await;

    let result = run(
        &executor,
        "UPDATE users SET name = upper(name) WHERE id = 2 RETURNING id, name",
    )
    .await
    .unwrap();
    assert_eq!(result.columns, ["id", "name"]);
    assert_eq!(result.rows, vec![vec!["2", "BOB"]]);

    let result = run(
        &executor,
        "WITH doomed AS (SELECT id FROM users WHERE name = 'alice') \
         DELETE FROM users WHERE id IN (SELECT id FROM doomed) RETURNING name",
    )
    .await
    .unwrap();
    assert_eq!(result.rows, vec![vec!["alice"]]);
}

#[tokio::test]
async fn test_dml_and_ddl_report_status() {
    let client = memory_client().await;
    let executor = QueryExecutor::new(client.as_ref(), &QueryConfig::default());
    seed(&executor).await;

    let result = run(&executor, "DELETE FROM users WHERE name = 'nobody'")
        .await
        .unwrap();
    assert!(!result.has_rows());
    assert_eq!(result.message, "0 row(s) affected");

    // A string that mentions RETURNING does not send the statement down the row path.
    let result = run(&executor, "UPDATE users SET name = 'RETURNING' WHERE id = 1")
        .await
        .unwrap();
    assert_eq!(result.message, "1 row(s) affected");
}

#[tokio::test]
async fn test_pragma_and_cte_select() {
    let client = memory_client().await;
    let executor = QueryExecutor::new(client.as_ref(), &QueryConfig::default());
    seed(&executor).await;

    let result = run(&executor, "PRAGMA table_info(users)").await.unwrap();
    assert_eq!(result.rows.len(), 4);

    let result = run(
        &executor,
        "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 5) \
         SELECT x FROM n",
    )
    .await
    .unwrap();
    assert_eq!(result.rows.len(), 5);
}

#[tokio::test]
async fn test_truncation_and_json_output() {
    let client = memory_client().await;
    let limits = QueryConfig {
        timeout_secs: 30,
        max_rows: 3,
    };
    let executor = QueryExecutor::new(client.as_ref(), &limits);

    let result = run(
        &executor,
        "WITH RECURSIVE n(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM n WHERE x < 10) \
         SELECT x FROM n",
    )
    .await
    .unwrap();
    assert_eq!(result.rows.len(), 3);
    assert_eq!(result.total_rows, 10);
    assert!(result.was_truncated);

    let json: serde_json::Value =
        serde_json::from_str(&output::render_json(&result).unwrap()).unwrap();
    assert_eq!(json["truncated"], true);
    assert_eq!(json["rows"], serde_json::json!([["1"], ["2"], ["3"]]));
}

#[tokio::test]
async fn test_engine_errors_surface_as_query_errors() {
    let client = memory_client().await;
    let executor = QueryExecutor::new(client.as_ref(), &QueryConfig::default());

    let err = run(&executor, "SELECT * FROM missing").await.unwrap_err();
    assert_eq!(err.category(), "Query Error");
    assert!(err.to_string().contains("no such table"));
}

#[tokio::test]
async fn test_tables_are_sorted() {
    let client = memory_client().await;
    client.execute("CREATE TABLE zeta (a INTEGER)").await.unwrap();
    client.execute("CREATE TABLE alpha (a INTEGER)").await.unwrap();

    assert_eq!(client.tables().await.unwrap(), ["alpha", "zeta"]);
    client.close().await.unwrap();
}
