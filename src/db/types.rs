//! Query result types for rowscope.
//!
//! `RawRows` is what a driver hands back from the row-fetching path; its
//! values are turned into display strings one cell at a time and collected
//! into a `QueryResult`, which is the only thing the presentation layer sees.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use std::fmt;
use std::time::Duration;

/// Columns and undecoded-for-display values returned by a driver query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRows {
    /// Column metadata for the result set.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data.
    pub rows: Vec<Row>,
}

impl RawRows {
    /// Creates a raw result with the given columns and rows.
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }
}

/// Outcome of a statement run through the status-only path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Rows touched by the statement, when the driver reports it.
    pub rows_affected: Option<u64>,
}

impl ExecOutcome {
    pub fn affected(rows: u64) -> Self {
        Self {
            rows_affected: Some(rows),
        }
    }

    /// Returns the status line shown to the user.
    pub fn message(&self) -> String {
        match self.rows_affected {
            Some(n) => format!("{n} row(s) affected"),
            None => "statement executed (rows affected unknown)".to_string(),
        }
    }
}

/// A fully materialized result, ready for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Column names; empty for status-only statements.
    pub columns: Vec<String>,

    /// Display strings, one per cell.
    pub rows: Vec<Vec<String>>,

    /// Summary line, e.g. `3 row(s) returned` or `1 row(s) affected`.
    pub message: String,

    /// Time taken to execute the statement.
    pub execution_time: Duration,

    /// Number of rows produced before truncation.
    pub total_rows: usize,

    /// Whether rows were dropped to stay under the row limit.
    pub was_truncated: bool,
}

impl QueryResult {
    /// Creates a status-only result.
    pub fn status(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Returns true if the statement produced a result set.
    pub fn has_rows(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Returns a truncation warning message if the result was truncated.
    pub fn truncation_warning(&self) -> Option<String> {
        if self.was_truncated {
            Some(format!(
                "Result truncated: showing {} of {} rows",
                self.rows.len(),
                self.total_rows
            ))
        } else {
            None
        }
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,

    /// Column data type as reported by the driver.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// Represents a single value from a database query.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text/string value.
    String(String),

    /// Binary data.
    Bytes(Vec<u8>),

    /// Point in time with its UTC offset.
    Timestamp(DateTime<FixedOffset>),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Renders the value for display. Total over every value.
    ///
    /// - NULL renders as `NULL`.
    /// - Bytes that are valid UTF-8 render as text, anything else as
    ///   lower-case hex without separators.
    /// - Timestamps render as RFC 3339 with second precision, using `Z` for
    ///   a zero offset.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::Bytes(b) => match std::str::from_utf8(b) {
                Ok(text) => text.to_string(),
                Err(_) => hex::encode(b),
            },
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

// Conversion implementations for common types
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v.fixed_offset())
    }
}

/// Timestamps without a zone are taken to be UTC.
impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Timestamp(v.and_utc().fixed_offset())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}
