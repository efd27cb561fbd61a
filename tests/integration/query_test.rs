//! Query execution tests against a live server.
//!
//! Skipped unless DATABASE_URL points at PostgreSQL or MySQL. Each test
//! creates and drops its own table.

use rowscope::classify::Dialect;
use rowscope::config::{ConnectionConfig, QueryConfig};
use rowscope::db::{self, DatabaseClient};
use rowscope::error::RowscopeError;
use rowscope::query::QueryExecutor;
use tokio_util::sync::CancellationToken;

/// Helper to create a client for the server named by DATABASE_URL.
async fn get_test_client() -> Option<Box<dyn DatabaseClient>> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    if config.dialect == Dialect::Sqlite {
        return None;
    }
    db::connect(&config).await.ok()
}

#[tokio::test]
async fn test_select_and_status_paths() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let executor = QueryExecutor::new(client.as_ref(), &QueryConfig::default());
    let token = CancellationToken::new();

    executor
        .run("DROP TABLE IF EXISTS rowscope_items", &token)
        .await
        .unwrap();
    executor
        .run(
            "CREATE TABLE rowscope_items (id INTEGER PRIMARY KEY, name VARCHAR(20))",
            &token,
        )
        .await
        .unwrap();

    let inserted = executor
        .run(
            "INSERT INTO rowscope_items VALUES (1, 'a'), (2, NULL)",
            &token,
        )
        .await
        .unwrap();
    assert_eq!(inserted.message, "2 row(s) affected");

    let selected = executor
        .run(
            "-- leading comment\nSELECT id, name FROM rowscope_items ORDER BY id",
            &token,
        )
        .await
        .unwrap();
    assert_eq!(selected.columns, ["id", "name"]);
    assert_eq!(selected.rows, vec![vec!["1", "a"], vec!["2", "NULL"]]);

    executor
        .run("DROP TABLE rowscope_items", &token)
        .await
        .unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_returning_follows_dialect() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    if client.dialect() != Dialect::Postgres {
        eprintln!("Skipping test: RETURNING needs PostgreSQL");
        return;
    }
    let executor = QueryExecutor::new(client.as_ref(), &QueryConfig::default());
    let token = CancellationToken::new();

    executor
        .run("DROP TABLE IF EXISTS rowscope_returning", &token)
        .await
        .unwrap();
    executor
        .run(
            "CREATE TABLE rowscope_returning (id SERIAL PRIMARY KEY, note TEXT)",
            &token,
        )
        .await
        .unwrap();

    let result = executor
        .run(
            "INSERT INTO rowscope_returning (note) VALUES ($$it's here$$) RETURNING id, note",
            &token,
        )
        .await
        .unwrap();
    assert_eq!(result.columns, ["id", "note"]);
    assert_eq!(result.rows, vec![vec!["1", "it's here"]]);

    let result = executor
        .run(
            "WITH gone AS (DELETE FROM rowscope_returning RETURNING id) SELECT count(*) FROM gone",
            &token,
        )
        .await
        .unwrap();
    assert_eq!(result.rows, vec![vec!["1"]]);

    executor
        .run("DROP TABLE rowscope_returning", &token)
        .await
        .unwrap();
    client.close().await.unwrap();
}

#[tokio::test]
async fn test_timeout_abandons_statement() {
    let Some(client) = get_test_client().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };
    let limits = QueryConfig {
        timeout_secs: 1,
        max_rows: 10,
    };
    let executor = QueryExecutor::new(client.as_ref(), &limits);

    let sleep = match client.dialect() {
        Dialect::Postgres => "SELECT pg_sleep(5)",
        _ => "SELECT SLEEP(5)",
    };
    let err = executor
        .run(sleep, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RowscopeError::Timeout(_)));

    client.close().await.unwrap();
}
