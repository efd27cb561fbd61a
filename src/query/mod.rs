//! Query execution for rowscope.
//!
//! Connects the statement classifier to the database client: the verdict
//! picks the driver path, and fetched rows are materialized for display.

pub mod executor;

pub use executor::{materialize, QueryExecutor};
