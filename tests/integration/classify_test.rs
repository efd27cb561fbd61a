//! Statement classification tests against the public API.
//!
//! These exercise realistic multi-line statements rather than the single
//! scanner primitives covered by the unit tests.

use pretty_assertions::assert_eq;
use rowscope::classify::{classify, cte_body_keyword, leading_keyword, Dialect, ShapeVerdict};

use Dialect::{MySql, Postgres, Sqlite};
use ShapeVerdict::{NoRows, ReturnsRows};

fn verdicts(sql: &str) -> [ShapeVerdict; 3] {
    [classify(sql, MySql), classify(sql, Postgres), classify(sql, Sqlite)]
}

#[test]
fn test_report_query_with_comments() {
    let sql = r#"
        -- monthly revenue
        /* generated by the reporting job */
        WITH RECURSIVE months(m) AS (
            SELECT 1
            UNION ALL
            SELECT m + 1 FROM months WHERE m < 12
        ),
        revenue AS (
            SELECT date_part('month', created_at) AS m, sum(total) AS total
            FROM orders
            WHERE note <> 'DELETE me'
            GROUP BY 1
        )
        SELECT months.m, coalesce(revenue.total, 0)
        FROM months LEFT JOIN revenue USING (m)
    "#;
    assert_eq!(verdicts(sql), [ReturnsRows, ReturnsRows, ReturnsRows]);
    assert_eq!(cte_body_keyword(sql, Postgres), Some("select"));
}

#[test]
fn test_upsert_with_returning() {
    let sql = "INSERT INTO users (email) VALUES ('a@example.com')\n\
               ON CONFLICT (email) DO UPDATE SET seen = now()\n\
               RETURNING id, (xmax = 0) AS inserted";
    assert_eq!(verdicts(sql), [NoRows, ReturnsRows, ReturnsRows]);
}

#[test]
fn test_returning_hidden_in_opaque_spans() {
    let cases = [
        "UPDATE t SET note = 'see RETURNING docs'",
        "UPDATE t SET note = 'it''s RETURNING'",
        r#"UPDATE "returning" SET a = 1"#,
        "DELETE FROM t -- RETURNING *",
        "DELETE FROM t /* RETURNING * */",
        "UPDATE t SET body = $$ RETURNING $$",
        "UPDATE t SET body = $fn$ RETURNING $fn$",
        "UPDATE t SET returning_count = 1",
    ];
    for sql in cases {
        assert_eq!(classify(sql, Postgres), NoRows, "{sql}");
    }
}

#[test]
fn test_sqlite_bracket_and_backtick_identifiers() {
    assert_eq!(classify("UPDATE [returning] SET a = 1", Sqlite), NoRows);
    assert_eq!(classify("UPDATE `returning` SET a = 1", Sqlite), NoRows);
    assert_eq!(
        classify("UPDATE [t] SET a = 1 RETURNING [a]", Sqlite),
        ReturnsRows
    );
}

#[test]
fn test_mysql_specific_syntax() {
    assert_eq!(leading_keyword("# note\nSELECT 1", MySql), "select");
    assert_eq!(classify("# note\nSELECT 1", MySql), ReturnsRows);
    assert_eq!(
        classify("WITH x AS (SELECT 'a\\')') SHOW TABLES", MySql),
        ReturnsRows
    );
    assert_eq!(classify("WITH c AS (SELECT 1) DESC t", MySql), ReturnsRows);
    assert_eq!(classify("WITH c AS (SELECT 1) DESC t", Postgres), NoRows);
}

#[test]
fn test_postgres_hash_and_escape_strings() {
    assert_eq!(classify("# c\nSELECT 1", Postgres), ReturnsRows);
    // Past the leading position `#` is the XOR operator, not a comment.
    assert_eq!(
        classify("UPDATE t SET a = a # 1 RETURNING a", Postgres),
        ReturnsRows
    );
    assert_eq!(
        classify(r"UPDATE t SET a = E'\'' RETURNING a", Postgres),
        ReturnsRows
    );
    assert_eq!(
        classify(r"UPDATE t SET a = e'it\'s RETURNING a'", Postgres),
        NoRows
    );
    // SQLite has no escape strings, so the same text leaves the literal open.
    assert_eq!(
        classify(r"UPDATE t SET a = E'\'' RETURNING a", Sqlite),
        NoRows
    );
}

#[test]
fn test_statement_separators_and_case() {
    assert_eq!(leading_keyword(";;\n  -- x\n sElEcT 1", Postgres), "select");
    assert_eq!(classify(";;\n  -- x\n sElEcT 1", Postgres), ReturnsRows);
    assert_eq!(leading_keyword("/* open", Postgres), "");
}

#[test]
fn test_recursive_prefix_is_not_a_keyword() {
    let sql = "WITH recursive_totals AS (SELECT 1) DELETE FROM t";
    assert_eq!(cte_body_keyword(sql, Postgres), Some("delete"));
    assert_eq!(classify(sql, Postgres), NoRows);
}

#[test]
fn test_adversarial_inputs_terminate() {
    let long_dollars = "$".repeat(50_000);
    let long_open = "(".repeat(50_000);
    let inputs = [
        long_dollars.as_str(),
        long_open.as_str(),
        "WITH a AS (SELECT '",
        "WITH a AS (SELECT $x$",
        "SELECT /* /* */",
        "INSERT INTO t VALUES ('a' RETURNING",
    ];
    for sql in inputs {
        for dialect in Dialect::ALL {
            let first = classify(sql, dialect);
            assert_eq!(first, classify(sql, dialect));
        }
    }
    assert_eq!(classify("WITH a AS (SELECT '", Postgres), NoRows);
}
