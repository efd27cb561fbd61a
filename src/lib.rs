//! rowscope - a lightweight SQL console that knows which statements return rows.
//!
//! This library exposes the core modules for use in integration tests.

pub mod classify;
pub mod cli;
pub mod config;
pub mod console;
pub mod db;
pub mod error;
pub mod logging;
pub mod output;
pub mod query;
