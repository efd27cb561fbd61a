//! Statement execution driven by shape classification.
//!
//! Each statement is classified once, then sent down exactly one driver
//! path: `query` for statements that return rows, `execute` for the rest.
//! The driver call races the configured deadline and the caller's
//! cancellation token.

use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::classify::{classify, Dialect};
use crate::config::QueryConfig;
use crate::db::{DatabaseClient, QueryResult, RawRows, Value};
use crate::error::{Result, RowscopeError};

/// Runs statements against one database client.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
    timeout: Duration,
    max_rows: usize,
}

impl<'a> QueryExecutor<'a> {
    /// Creates an executor using the limits from `config`.
    pub fn new(db: &'a dyn DatabaseClient, config: &QueryConfig) -> Self {
        Self {
            db,
            timeout: config.timeout(),
            max_rows: config.max_rows,
        }
    }

    /// Dialect of the underlying client.
    pub fn dialect(&self) -> Dialect {
        self.db.dialect()
    }

    /// Classifies and runs `sql`.
    ///
    /// Fails with `Timeout` when the deadline passes and `Cancelled` when
    /// `cancel` fires first; the driver future is dropped in both cases.
    pub async fn run(&self, sql: &str, cancel: &CancellationToken) -> Result<QueryResult> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(RowscopeError::query("query is empty"));
        }

        let dialect = self.db.dialect();
        let verdict = classify(sql, dialect);
        debug!(%dialect, %verdict, "classified statement");

        let start = Instant::now();
        let call = async {
            if verdict.returns_rows() {
                self.db
                    .query(sql)
                    .await
                    .map(|raw| materialize(raw, self.max_rows))
            } else {
                self.db
                    .execute(sql)
                    .await
                    .map(|outcome| QueryResult::status(outcome.message()))
            }
        };

        let result = tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(RowscopeError::Cancelled),
            timed = tokio::time::timeout(self.timeout, call) => {
                timed.map_err(|_| RowscopeError::Timeout(self.timeout))?
            }
        }?;

        Ok(result.with_execution_time(start.elapsed()))
    }
}

/// Turns driver rows into display strings, keeping at most `max_rows` rows.
pub fn materialize(raw: RawRows, max_rows: usize) -> QueryResult {
    let total_rows = raw.rows.len();
    let was_truncated = total_rows > max_rows;
    if was_truncated {
        warn!(
            "Query returned {} rows, truncating to {} rows",
            total_rows, max_rows
        );
    }

    let columns = raw.columns.into_iter().map(|c| c.name).collect();
    let rows = raw
        .rows
        .iter()
        .take(max_rows)
        .map(|row| row.iter().map(Value::to_display_string).collect())
        .collect();

    QueryResult {
        columns,
        rows,
        message: format!("{total_rows} row(s) returned"),
        execution_time: Duration::ZERO,
        total_rows,
        was_truncated,
    }
}
