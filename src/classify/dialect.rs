//! SQL dialects and their classification capabilities.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::lexer::Syntax;

/// Supported database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    MySql,
    #[default]
    Postgres,
    Sqlite,
}

/// What a dialect can do, as far as result-shape detection is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Lexical features of the dialect.
    pub syntax: Syntax,
    /// Whether DML may carry a `RETURNING` clause.
    pub supports_returning: bool,
    /// Leading keywords that always produce a result set.
    pub row_keywords: &'static [&'static str],
}

const MYSQL: Capabilities = Capabilities {
    syntax: Syntax {
        hash_comments: true,
        backtick_quotes: true,
        bracket_quotes: false,
        dollar_quotes: false,
        backslash_escapes: true,
        escape_strings: false,
    },
    supports_returning: false,
    row_keywords: &[
        "select", "values", "table", "explain", "show", "describe", "desc",
    ],
};

const POSTGRES: Capabilities = Capabilities {
    syntax: Syntax {
        hash_comments: false,
        backtick_quotes: false,
        bracket_quotes: false,
        dollar_quotes: true,
        backslash_escapes: false,
        escape_strings: true,
    },
    supports_returning: true,
    row_keywords: &["select", "values", "table", "explain", "show"],
};

const SQLITE: Capabilities = Capabilities {
    syntax: Syntax {
        hash_comments: false,
        backtick_quotes: true,
        bracket_quotes: true,
        dollar_quotes: false,
        backslash_escapes: false,
        escape_strings: false,
    },
    supports_returning: true,
    row_keywords: &["select", "values", "table", "explain", "pragma"],
};

impl Dialect {
    /// All dialects, in a stable order.
    pub const ALL: [Dialect; 3] = [Dialect::MySql, Dialect::Postgres, Dialect::Sqlite];

    /// Returns the dialect name used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a dialect name. Accepts a few common aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mysql" | "mariadb" => Some(Self::MySql),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Infers the dialect from how a database was addressed.
    ///
    /// `mysql://` and `postgres://`/`postgresql://` URLs select their
    /// engines; anything else (a `sqlite:` URL or a bare file path) is SQLite.
    pub fn from_connection_string(conn_str: &str) -> Self {
        let lower = conn_str.trim_start().to_lowercase();
        if lower.starts_with("mysql://") || lower.starts_with("mariadb://") {
            Self::MySql
        } else if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Self::Postgres
        } else {
            Self::Sqlite
        }
    }

    /// Returns the default TCP port, or `None` for file-based engines.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySql => Some(3306),
            Self::Postgres => Some(5432),
            Self::Sqlite => None,
        }
    }

    /// Returns the URL scheme understood by the driver.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Returns the capability record for this dialect.
    pub fn capabilities(&self) -> &'static Capabilities {
        match self {
            Self::MySql => &MYSQL,
            Self::Postgres => &POSTGRES,
            Self::Sqlite => &SQLITE,
        }
    }

    pub fn syntax(&self) -> Syntax {
        self.capabilities().syntax
    }

    pub fn supports_returning(&self) -> bool {
        self.capabilities().supports_returning
    }

    /// Returns true if a statement led by `keyword` always yields rows.
    pub fn is_row_keyword(&self, keyword: &str) -> bool {
        self.capabilities()
            .row_keywords
            .iter()
            .any(|&kw| kw == keyword)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MySql => write!(f, "MySQL"),
            Self::Postgres => write!(f, "PostgreSQL"),
            Self::Sqlite => write!(f, "SQLite"),
        }
    }
}
