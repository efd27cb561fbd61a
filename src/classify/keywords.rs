//! Keyword extraction over raw statement text.
//!
//! These scanners never build a syntax tree. They walk the text once,
//! stepping over comments and quoted spans, and look at bare words only.

use super::dialect::Dialect;
use super::lexer::{is_ident_byte, Scanner};

/// Keywords that can start the body of a `WITH` statement.
const CTE_BODY_KEYWORDS: &[&str] = &[
    "select", "insert", "update", "delete", "merge", "values", "table", "show", "describe",
    "desc", "explain", "pragma",
];

/// Returns the offset of the first word, past whitespace, comments and
/// stray `;` separators.
fn statement_start(scanner: &Scanner<'_>) -> usize {
    let mut pos = 0;
    loop {
        pos = scanner.skip_trivia(pos);
        match scanner.byte(pos) {
            Some(b';') => pos += 1,
            // A leading `#` is a comment in every dialect.
            Some(b'#') => pos = scanner.skip_line_comment(pos),
            _ => return pos,
        }
    }
}

/// Returns the first word of `sql`, lower-cased, or an empty string when
/// the text holds no statement (empty, comments only, unterminated comment).
pub fn leading_keyword(sql: &str, dialect: Dialect) -> String {
    let scanner = Scanner::new(sql, dialect.syntax());
    let start = statement_start(&scanner);
    let end = scanner.word_end(start);
    scanner.word(start, end).to_ascii_lowercase()
}

/// Resolves the keyword that starts the body of a `WITH` statement.
///
/// Steps over `WITH`, an optional `RECURSIVE`, and every CTE definition.
/// Returns `None` when no body keyword is found at parenthesis depth zero.
pub fn cte_body_keyword(sql: &str, dialect: Dialect) -> Option<&'static str> {
    let scanner = Scanner::new(sql, dialect.syntax());

    let with_start = statement_start(&scanner);
    let mut pos = scanner.word_end(with_start);
    if pos == with_start {
        return None;
    }

    let next = scanner.skip_trivia(pos);
    let next_end = scanner.word_end(next);
    if scanner
        .word(next, next_end)
        .eq_ignore_ascii_case("recursive")
    {
        pos = next_end;
    }

    let mut depth: isize = 0;
    while pos < scanner.len() {
        pos = scanner.skip_trivia(pos);
        let Some(b) = scanner.byte(pos) else {
            break;
        };
        if let Some(end) = scanner.skip_opaque(pos) {
            pos = end;
            continue;
        }
        match b {
            b'(' => {
                depth += 1;
                pos += 1;
            }
            b')' => {
                depth -= 1;
                pos += 1;
            }
            b if is_ident_byte(b) => {
                let end = scanner.word_end(pos);
                if depth == 0 {
                    let word = scanner.word(pos, end);
                    if let Some(kw) = CTE_BODY_KEYWORDS
                        .iter()
                        .copied()
                        .find(|kw| kw.eq_ignore_ascii_case(word))
                    {
                        return Some(kw);
                    }
                    // Anything else here is `AS` or a CTE name.
                }
                pos = end;
            }
            _ => pos += 1,
        }
    }
    None
}

/// Returns true if `keyword` appears as a bare word outside every comment
/// and quoted span. Matching is ASCII case-insensitive.
pub fn contains_keyword(sql: &str, keyword: &str, dialect: Dialect) -> bool {
    let scanner = Scanner::new(sql, dialect.syntax());
    let mut pos = 0;
    while let Some(b) = scanner.byte(pos) {
        if let Some(end) = scanner.skip_opaque(pos) {
            pos = end;
        } else if is_ident_byte(b) {
            // Whole words only, so both neighbours are non-word bytes.
            let end = scanner.word_end(pos);
            if scanner.word(pos, end).eq_ignore_ascii_case(keyword) {
                return true;
            }
            pos = end;
        } else {
            pos += 1;
        }
    }
    false
}
