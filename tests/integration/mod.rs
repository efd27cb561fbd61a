//! Integration tests for rowscope.

pub mod classify_test;
pub mod connection_test;
pub mod query_test;
pub mod sqlite_test;
