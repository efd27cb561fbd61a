//! Command-line argument parsing for rowscope.
//!
//! Uses clap to parse connection, execution, and output options.

use crate::classify::Dialect;
use crate::config::{ConnectionConfig, QueryConfig, SQLITE_MEMORY};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Output format for statement results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table followed by the status line.
    #[default]
    Text,
    /// One JSON object per statement.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid output format: {s}. Expected: text or json")),
        }
    }
}

fn parse_dialect(s: &str) -> std::result::Result<Dialect, String> {
    Dialect::parse(s).ok_or_else(|| {
        format!("Invalid dialect: {s}. Expected: mysql, postgres, or sqlite")
    })
}

/// A lightweight SQL console that knows which statements return rows.
#[derive(Parser, Debug)]
#[command(name = "rowscope")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Connection string (postgres://..., mysql://..., sqlite:path, or a database file)
    #[arg(value_name = "CONNECTION_STRING")]
    pub connection_string: Option<String>,

    /// Database host
    #[arg(short = 'H', long, value_name = "HOST")]
    pub host: Option<String>,

    /// Database port (defaults to the dialect's standard port)
    #[arg(short = 'p', long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database name (the database file for SQLite)
    #[arg(short = 'd', long, value_name = "DATABASE")]
    pub database: Option<String>,

    /// Database user
    #[arg(short = 'U', long, value_name = "USER")]
    pub user: Option<String>,

    /// Database engine when connecting with individual arguments
    #[arg(long, value_name = "DIALECT", value_parser = parse_dialect)]
    pub dialect: Option<Dialect>,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH", env = "ROWSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Statement to run; may be repeated. Skips the interactive prompt.
    #[arg(short = 'e', long = "execute", value_name = "SQL")]
    pub execute: Vec<String>,

    /// Seconds before a statement is abandoned
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum rows shown per result
    #[arg(long, value_name = "N")]
    pub max_rows: Option<usize>,

    /// Output format (text or json)
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: OutputFormat,

    /// List tables and exit
    #[arg(long)]
    pub tables: bool,

    /// Write logs to the state directory instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Converts CLI arguments to a ConnectionConfig.
    ///
    /// This creates a config from CLI args only, without merging with file config.
    pub fn to_connection_config(&self) -> Result<Option<ConnectionConfig>> {
        if let Some(conn_str) = &self.connection_string {
            return Ok(Some(ConnectionConfig::from_connection_string(conn_str)?));
        }

        let any_arg = self.host.is_some()
            || self.port.is_some()
            || self.database.is_some()
            || self.user.is_some()
            || self.dialect.is_some();
        if !any_arg {
            return Ok(None);
        }

        let dialect = self.dialect.unwrap_or_default();
        if dialect == Dialect::Sqlite {
            let path = self.database.as_deref().unwrap_or(SQLITE_MEMORY);
            return Ok(Some(ConnectionConfig::sqlite(path)));
        }

        Ok(Some(ConnectionConfig {
            dialect,
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            user: self.user.clone(),
            // Passwords come from the environment or the config file.
            password: None,
            path: None,
        }))
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }

    /// Returns the named connection to use, if specified.
    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Applies `--timeout` and `--max-rows` on top of the configured limits.
    pub fn query_config(&self, base: &QueryConfig) -> QueryConfig {
        QueryConfig {
            timeout_secs: self.timeout.unwrap_or(base.timeout_secs),
            max_rows: self.max_rows.unwrap_or(base.max_rows),
        }
    }
}
