//! Result-shape classification for SQL statements.
//!
//! Decides, from raw statement text and the target dialect, whether a
//! statement produces a result set (run it as a query and fetch rows) or
//! only a status (run it as an execute). The decision is lexical: no AST is
//! built, and anything that cannot be resolved is treated as `NoRows`.

mod dialect;
mod keywords;
mod lexer;

pub use dialect::{Capabilities, Dialect};
pub use keywords::{contains_keyword, cte_body_keyword, leading_keyword};
pub use lexer::Syntax;

use lexer::Scanner;

use std::fmt;

/// Whether a statement yields a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeVerdict {
    /// Run as a query and fetch rows.
    ReturnsRows,
    /// Run as an execute and report a status.
    NoRows,
}

impl ShapeVerdict {
    pub fn returns_rows(&self) -> bool {
        matches!(self, Self::ReturnsRows)
    }

    fn from_bool(returns_rows: bool) -> Self {
        if returns_rows {
            Self::ReturnsRows
        } else {
            Self::NoRows
        }
    }
}

impl fmt::Display for ShapeVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReturnsRows => write!(f, "returns rows"),
            Self::NoRows => write!(f, "no rows"),
        }
    }
}

/// Classifies `sql` for the given dialect.
///
/// 1. A statement led by one of the dialect's row keywords returns rows.
/// 2. For `WITH`, the keyword of the statement body decides; a body that is
///    not a row keyword falls through to the `RETURNING` check.
/// 3. Otherwise the statement returns rows only if the dialect supports
///    `RETURNING` and the text carries a bare `RETURNING` word.
pub fn classify(sql: &str, dialect: Dialect) -> ShapeVerdict {
    let keyword = leading_keyword(sql, dialect);
    if keyword.is_empty() {
        return ShapeVerdict::NoRows;
    }
    if dialect.is_row_keyword(&keyword) {
        return ShapeVerdict::ReturnsRows;
    }
    if keyword == "with" {
        if let Some(body) = cte_body_keyword(sql, dialect) {
            if dialect.is_row_keyword(body) {
                return ShapeVerdict::ReturnsRows;
            }
        }
    }
    ShapeVerdict::from_bool(
        dialect.supports_returning() && contains_keyword(sql, "returning", dialect),
    )
}

/// Returns true when `sql` stops inside a string, quoted identifier,
/// block comment or dollar-quoted body that is still open.
pub fn ends_in_open_span(sql: &str, dialect: Dialect) -> bool {
    Scanner::new(sql, dialect.syntax()).ends_in_open_span()
}

#[cfg(test)]
mod tests {
    use super::*;

    use super::Dialect::{MySql, Postgres, Sqlite};

    #[test]
    fn test_select_and_empty_for_all_dialects() {
        for dialect in Dialect::ALL {
            assert_eq!(classify("SELECT 1", dialect), ShapeVerdict::ReturnsRows);
            assert_eq!(classify("", dialect), ShapeVerdict::NoRows);
            assert_eq!(classify("   \n\t", dialect), ShapeVerdict::NoRows);
            assert_eq!(classify("-- just a note", dialect), ShapeVerdict::NoRows);
        }
    }

    #[test]
    fn test_returning_capability_gating() {
        let plain = "INSERT INTO t VALUES (1)";
        let returning = "INSERT INTO t VALUES (1) RETURNING id";

        assert_eq!(classify(plain, Postgres), ShapeVerdict::NoRows);
        assert_eq!(classify(returning, Postgres), ShapeVerdict::ReturnsRows);
        assert_eq!(classify(returning, Sqlite), ShapeVerdict::ReturnsRows);
        assert_eq!(classify(returning, MySql), ShapeVerdict::NoRows);
    }

    #[test]
    fn test_returning_in_opaque_spans() {
        let cases = [
            "INSERT INTO t VALUES ('RETURNING')",
            r#"INSERT INTO "returning" VALUES (1)"#,
            "INSERT INTO t VALUES (1) -- RETURNING id",
            "INSERT INTO t VALUES (1) /* RETURNING id */",
        ];
        for sql in cases {
            assert_eq!(classify(sql, Postgres), ShapeVerdict::NoRows, "{sql}");
            assert_eq!(classify(sql, Sqlite), ShapeVerdict::NoRows, "{sql}");
        }
    }

    #[test]
    fn test_cte_select_for_all_dialects() {
        for dialect in Dialect::ALL {
            assert_eq!(
                classify("WITH c AS (SELECT 1) SELECT * FROM c", dialect),
                ShapeVerdict::ReturnsRows,
                "{dialect}"
            );
        }
    }

    #[test]
    fn test_cte_dml_needs_returning() {
        let delete = "WITH c AS (SELECT 1) DELETE FROM t";
        let delete_returning = "WITH c AS (SELECT 1) DELETE FROM t RETURNING *";

        assert_eq!(classify(delete, Postgres), ShapeVerdict::NoRows);
        assert_eq!(classify(delete_returning, Postgres), ShapeVerdict::ReturnsRows);
        assert_eq!(classify(delete, Sqlite), ShapeVerdict::NoRows);
        assert_eq!(classify(delete_returning, Sqlite), ShapeVerdict::ReturnsRows);
        assert_eq!(classify(delete_returning, MySql), ShapeVerdict::NoRows);
    }

    #[test]
    fn test_cte_nested_and_multiple() {
        let sql = "WITH a AS (SELECT (1 + (2)) AS x), b(y) AS (SELECT x FROM a WHERE x IN (SELECT 1)) \
                   SELECT * FROM b";
        for dialect in Dialect::ALL {
            assert_eq!(classify(sql, dialect), ShapeVerdict::ReturnsRows, "{dialect}");
        }

        let sql = "WITH a AS (SELECT 1), b AS (SELECT 2) UPDATE t SET v = (SELECT 1) RETURNING v";
        assert_eq!(classify(sql, Postgres), ShapeVerdict::ReturnsRows);
        assert_eq!(classify(sql, MySql), ShapeVerdict::NoRows);
    }

    #[test]
    fn test_returning_anywhere_in_cte_statement() {
        // RETURNING is searched across the whole text, CTE definitions included.
        let sql = "WITH moved AS (DELETE FROM a RETURNING *) INSERT INTO b SELECT * FROM moved";
        assert_eq!(classify(sql, Postgres), ShapeVerdict::ReturnsRows);
    }

    #[test]
    fn test_dialect_specific_row_keywords() {
        assert_eq!(classify("SHOW TABLES", MySql), ShapeVerdict::ReturnsRows);
        assert_eq!(classify("DESCRIBE users", MySql), ShapeVerdict::ReturnsRows);
        assert_eq!(classify("desc users", MySql), ShapeVerdict::ReturnsRows);
        assert_eq!(classify("SHOW search_path", Postgres), ShapeVerdict::ReturnsRows);
        assert_eq!(classify("PRAGMA table_info(t)", Sqlite), ShapeVerdict::ReturnsRows);

        assert_eq!(classify("DESCRIBE users", Postgres), ShapeVerdict::NoRows);
        assert_eq!(classify("PRAGMA table_info(t)", MySql), ShapeVerdict::NoRows);
        assert_eq!(classify("SHOW TABLES", Sqlite), ShapeVerdict::NoRows);
    }

    #[test]
    fn test_common_statements() {
        for dialect in Dialect::ALL {
            assert_eq!(classify("EXPLAIN SELECT 1", dialect), ShapeVerdict::ReturnsRows);
            assert_eq!(classify("VALUES (1, 2)", dialect), ShapeVerdict::ReturnsRows);
            assert_eq!(classify("UPDATE t SET a=1", dialect), ShapeVerdict::NoRows);
            assert_eq!(classify("DELETE FROM t", dialect), ShapeVerdict::NoRows);
            assert_eq!(
                classify("CREATE TABLE t (id INTEGER)", dialect),
                ShapeVerdict::NoRows
            );
            assert_eq!(
                classify("/* hi */ ;  select 1", dialect),
                ShapeVerdict::ReturnsRows
            );
        }
    }

    #[test]
    fn test_unknown_keyword_without_returning() {
        assert_eq!(
            classify("MERGE INTO t USING s ON t.id = s.id WHEN MATCHED THEN DELETE", Postgres),
            ShapeVerdict::NoRows
        );
    }

    #[test]
    fn test_malformed_input_terminates() {
        let inputs = [
            "/* unterminated SELECT 1",
            "UPDATE t SET a = 'open RETURNING a",
            "WITH a AS (SELECT 1",
            "WITH",
            "WITH a AS ($$ open",
            "$$$$$$$$$$",
            "$a$$b$$c$",
            "((((((((((((((((((((",
            "))))))))) SELECT",
            "'",
            "\"",
            "`",
            "[",
            "--",
            "/*",
            "#",
        ];
        for sql in inputs {
            for dialect in Dialect::ALL {
                // Only termination matters here; the verdict itself must be defined.
                let _ = classify(sql, dialect);
            }
        }
        assert_eq!(
            classify("/* unterminated SELECT 1", Postgres),
            ShapeVerdict::NoRows
        );
        assert_eq!(
            classify("UPDATE t SET a = 'open RETURNING a", Postgres),
            ShapeVerdict::NoRows
        );
    }

    #[test]
    fn test_deep_nesting() {
        let sql = format!(
            "WITH a AS ({}SELECT 1{}) SELECT * FROM a",
            "(".repeat(10_000),
            ")".repeat(10_000)
        );
        assert_eq!(classify(&sql, Postgres), ShapeVerdict::ReturnsRows);
    }

    #[test]
    fn test_classification_is_pure() {
        let sql = "WITH c AS (SELECT 1) UPDATE t SET a = 1 RETURNING a";
        for dialect in Dialect::ALL {
            assert_eq!(classify(sql, dialect), classify(sql, dialect));
        }
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(ShapeVerdict::ReturnsRows.to_string(), "returns rows");
        assert_eq!(ShapeVerdict::NoRows.to_string(), "no rows");
        assert!(ShapeVerdict::ReturnsRows.returns_rows());
        assert!(!ShapeVerdict::NoRows.returns_rows());
    }

    #[test]
    fn test_ends_in_open_span_follows_dialect() {
        let body = "CREATE FUNCTION f() RETURNS int AS $$\nBEGIN\n";
        assert!(ends_in_open_span(body, Postgres));
        assert!(!ends_in_open_span(body, MySql));

        assert!(ends_in_open_span("SELECT 'a\\'", MySql));
        assert!(!ends_in_open_span("SELECT 'a\\'", Sqlite));
        assert!(ends_in_open_span("SELECT [open", Sqlite));
        assert!(!ends_in_open_span("SELECT [open", Postgres));
    }
}
