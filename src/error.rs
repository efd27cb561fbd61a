//! Error types for rowscope.
//!
//! Defines the main error enum used throughout the application. The
//! statement classifier itself never fails; these errors come from the
//! boundary (configuration, drivers, the execution deadline).

use std::time::Duration;
use thiserror::Error;

/// Main error type for rowscope operations.
#[derive(Error, Debug)]
pub enum RowscopeError {
    /// Database connection errors (host unreachable, auth failed, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, constraint violations, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// The statement did not finish before the deadline.
    #[error("Query timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// The statement was cancelled by the user.
    #[error("Query cancelled")]
    Cancelled,

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Terminal or file I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RowscopeError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) | Self::Timeout(_) | Self::Cancelled => "Query Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using RowscopeError.
pub type Result<T> = std::result::Result<T, RowscopeError>;
