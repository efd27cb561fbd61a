//! Database abstraction layer for rowscope.
//!
//! Provides a trait-based interface for database operations, allowing
//! different database backends to be used interchangeably. A client never
//! decides on its own whether a statement returns rows: the caller picks
//! `query` or `execute` from the statement's classification.

mod mock;
mod mysql;
mod postgres;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockCall, MockDatabaseClient};
pub use mysql::MySqlClient;
pub use postgres::PostgresClient;
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, ExecOutcome, QueryResult, RawRows, Row, Value};

use crate::classify::Dialect;
use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Maximum number of connection retry attempts.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Base delay between retry attempts (doubles each retry).
const RETRY_BASE_DELAY_MS: u64 = 500;

/// Creates a database client for the given configuration.
///
/// This is the central factory function for database connections.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    match config.dialect {
        Dialect::Postgres => Ok(Box::new(PostgresClient::connect(config).await?)),
        Dialect::MySql => Ok(Box::new(MySqlClient::connect(config).await?)),
        Dialect::Sqlite => Ok(Box::new(SqliteClient::connect(config).await?)),
    }
}

/// Trait defining the interface for database clients.
///
/// All database operations are async and return Results with RowscopeError.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// The dialect statements for this client are written in.
    fn dialect(&self) -> Dialect;

    /// Runs a statement that produces a result set and fetches its rows.
    async fn query(&self, sql: &str) -> Result<RawRows>;

    /// Runs a statement that produces only a status.
    async fn execute(&self, sql: &str) -> Result<ExecOutcome>;

    /// Lists user tables, sorted by name.
    async fn tables(&self) -> Result<Vec<String>>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

/// Returns true if a connection error looks worth retrying.
fn is_transient_error(error: &sqlx::Error) -> bool {
    if matches!(error, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) {
        return true;
    }

    let error_str = error.to_string().to_lowercase();

    // Authentication and missing-database errors never resolve on retry.
    if error_str.contains("authentication failed")
        || error_str.contains("access denied")
        || error_str.contains("does not exist")
        || error_str.contains("unknown database")
    {
        return false;
    }

    error_str.contains("connection refused")
        || error_str.contains("timed out")
        || error_str.contains("temporarily unavailable")
        || error_str.contains("connection reset")
        || error_str.contains("broken pipe")
}

/// Runs `attempt` until it succeeds, fails permanently, or retries run out.
///
/// The delay doubles after every transient failure.
async fn connect_with_retry<T, F, Fut>(mut attempt: F) -> std::result::Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
    let mut n = 1;
    loop {
        tracing::debug!("Connection attempt {} of {}", n, MAX_RETRY_ATTEMPTS);
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if n < MAX_RETRY_ATTEMPTS && is_transient_error(&e) => {
                tracing::warn!(
                    "Connection attempt {} failed (transient error), retrying in {:?}",
                    n,
                    delay
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                n += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> crate::error::RowscopeError {
    use crate::error::RowscopeError;

    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config
        .effective_port()
        .map(|p| p.to_string())
        .unwrap_or_default();
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        RowscopeError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("authentication failed") || error_str.contains("access denied") {
        RowscopeError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if (error_str.contains("does not exist") && error_str.contains("database"))
        || error_str.contains("unknown database")
    {
        RowscopeError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        RowscopeError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        RowscopeError::connection(error.to_string())
    }
}
