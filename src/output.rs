//! Rendering of statement results for the console.

use crate::cli::OutputFormat;
use crate::db::QueryResult;
use crate::error::{Result, RowscopeError};
use comfy_table::Table;
use serde::Serialize;

/// JSON shape of one statement result.
#[derive(Debug, Serialize)]
struct JsonResult<'a> {
    columns: &'a [String],
    rows: &'a [Vec<String>],
    message: &'a str,
    execution_time_ms: u64,
    truncated: bool,
}

/// Renders `result` in the requested format, without a trailing newline.
pub fn render(result: &QueryResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(result)),
        OutputFormat::Json => render_json(result),
    }
}

/// Renders a table list, one name per line or as a JSON array.
pub fn render_tables(tables: &[String], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(tables.join("\n")),
        OutputFormat::Json => serde_json::to_string(tables)
            .map_err(|e| RowscopeError::internal(format!("Failed to encode tables: {e}"))),
    }
}

/// Renders an aligned table followed by the status line.
pub fn render_text(result: &QueryResult) -> String {
    let mut out = String::new();

    if result.has_rows() {
        let mut table = Table::new();
        table.set_header(&result.columns);
        for row in &result.rows {
            table.add_row(row);
        }
        out.push_str(&table.to_string());
        out.push('\n');
    }

    out.push_str(&format!(
        "{} ({} ms)",
        result.message,
        result.execution_time.as_millis()
    ));
    if let Some(warning) = result.truncation_warning() {
        out.push('\n');
        out.push_str(&warning);
    }
    out
}

/// Renders the result as a single-line JSON object.
pub fn render_json(result: &QueryResult) -> Result<String> {
    let json = JsonResult {
        columns: &result.columns,
        rows: &result.rows,
        message: &result.message,
        execution_time_ms: result.execution_time.as_millis() as u64,
        truncated: result.was_truncated,
    };
    serde_json::to_string(&json)
        .map_err(|e| RowscopeError::internal(format!("Failed to encode result: {e}")))
}
