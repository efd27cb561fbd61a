//! Mock database clients for testing.
//!
//! `MockDatabaseClient` answers from canned results and records which path
//! each statement took, so callers can be tested without a live server.

use super::{ColumnInfo, DatabaseClient, ExecOutcome, RawRows, Value};
use crate::classify::Dialect;
use crate::error::{Result, RowscopeError};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A statement as seen by the mock, tagged with the path it went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Query(String),
    Execute(String),
}

/// A mock database client that returns predefined results.
pub struct MockDatabaseClient {
    dialect: Dialect,
    rows: RawRows,
    outcome: ExecOutcome,
    tables: Vec<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockDatabaseClient {
    /// Creates a mock for `dialect` that returns one text row for queries
    /// and zero affected rows for executes.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            rows: RawRows::new(
                vec![ColumnInfo::new("result", "text")],
                vec![vec![Value::String("mock".to_string())]],
            ),
            outcome: ExecOutcome::affected(0),
            tables: Vec::new(),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sets the result returned by `query`.
    pub fn with_rows(mut self, rows: RawRows) -> Self {
        self.rows = rows;
        self
    }

    /// Sets the outcome returned by `execute`.
    pub fn with_outcome(mut self, outcome: ExecOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Sets the table list.
    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = tables;
        self
    }

    /// Makes every statement take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the statements seen so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    async fn record(&self, call: MockCall) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn query(&self, sql: &str) -> Result<RawRows> {
        self.record(MockCall::Query(sql.to_string())).await;
        Ok(self.rows.clone())
    }

    async fn execute(&self, sql: &str) -> Result<ExecOutcome> {
        self.record(MockCall::Execute(sql.to_string())).await;
        Ok(self.outcome)
    }

    async fn tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.clone())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A client whose every statement fails with the given message.
pub struct FailingDatabaseClient {
    dialect: Dialect,
    message: String,
}

impl FailingDatabaseClient {
    pub fn new(dialect: Dialect, message: impl Into<String>) -> Self {
        Self {
            dialect,
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn query(&self, _sql: &str) -> Result<RawRows> {
        Err(RowscopeError::query(self.message.clone()))
    }

    async fn execute(&self, _sql: &str) -> Result<ExecOutcome> {
        Err(RowscopeError::query(self.message.clone()))
    }

    async fn tables(&self) -> Result<Vec<String>> {
        Err(RowscopeError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
