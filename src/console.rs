//! Line-oriented console: statement buffering, one-shot runs, and the prompt loop.

use std::fs;
use std::path::{Path, PathBuf};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::classify::{ends_in_open_span, Dialect};
use crate::cli::OutputFormat;
use crate::error::{Result, RowscopeError};
use crate::output;
use crate::query::QueryExecutor;

const PROMPT: &str = "rowscope> ";
const CONTINUATION_PROMPT: &str = "      -> ";
const QUIT_COMMAND: &str = "\\q";

/// Accumulates input lines until a statement is complete.
///
/// A statement is complete at a line ending in `;` or at a blank line
/// following some input, unless the text so far ends inside an open
/// string, comment or `$$` body.
#[derive(Debug)]
pub struct StatementBuffer {
    dialect: Dialect,
    text: String,
}

impl StatementBuffer {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            text: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Adds a line; returns the statement when the line completes one.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let trimmed = line.trim();
        if trimmed.is_empty() && self.is_empty() {
            self.text.clear();
            return None;
        }

        self.text.push_str(line.trim_end_matches('\r'));
        self.text.push('\n');
        let at_boundary = trimmed.is_empty() || trimmed.ends_with(';');
        if at_boundary && !ends_in_open_span(&self.text, self.dialect) {
            self.finish()
        } else {
            None
        }
    }

    /// Returns whatever is buffered as a statement, if anything.
    pub fn finish(&mut self) -> Option<String> {
        let text = std::mem::take(&mut self.text);
        let statement = strip_terminator(&text);
        if statement.is_empty() {
            None
        } else {
            Some(statement.to_string())
        }
    }

    /// Feeds one input line. Returns `None` when the line asks to quit.
    fn accept(&mut self, line: &str) -> Option<Option<String>> {
        if self.is_empty() && line.trim() == QUIT_COMMAND {
            debug!("Quit requested");
            return None;
        }
        Some(self.push_line(line))
    }
}

/// Removes surrounding whitespace and trailing `;` terminators.
pub fn strip_terminator(sql: &str) -> &str {
    sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace())
}

/// Runs one statement and prints its result. Ctrl-C cancels the statement.
pub async fn run_statement(
    executor: &QueryExecutor<'_>,
    sql: &str,
    format: OutputFormat,
) -> Result<()> {
    let token = CancellationToken::new();
    let watcher = tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        }
    });

    let result = executor.run(strip_terminator(sql), &token).await;
    watcher.abort();

    println!("{}", output::render(&result?, format)?);
    Ok(())
}

/// Runs each statement in order, stopping at the first failure.
pub async fn run_script(
    executor: &QueryExecutor<'_>,
    statements: &[String],
    format: OutputFormat,
) -> Result<()> {
    for sql in statements {
        run_statement(executor, sql, format).await?;
    }
    Ok(())
}

/// Reads statements from `input` until `\q` or end of input, without
/// prompting. Used for piped stdin.
///
/// Statement errors are reported and the loop continues.
pub async fn run_input<R>(executor: &QueryExecutor<'_>, input: R, format: OutputFormat) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut buffer = StatementBuffer::new(executor.dialect());
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        match buffer.accept(&line) {
            None => return Ok(()),
            Some(Some(sql)) => report(run_statement(executor, &sql, format).await),
            Some(None) => {}
        }
    }

    if let Some(sql) = buffer.finish() {
        report(run_statement(executor, &sql, format).await);
    }
    Ok(())
}

/// Interactive prompt with line editing and persistent history.
///
/// Ctrl-C at the prompt discards the pending statement; Ctrl-D or `\q`
/// leaves.
pub async fn interactive(executor: &QueryExecutor<'_>, format: OutputFormat) -> Result<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| RowscopeError::internal(format!("Failed to start line editor: {e}")))?;
    let history = history_path();
    if let Some(path) = &history {
        if let Err(e) = editor.load_history(path) {
            debug!("No history loaded from {}: {}", path.display(), e);
        }
    }

    let mut buffer = StatementBuffer::new(executor.dialect());
    loop {
        let prompt = if buffer.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        };

        match editor.readline(prompt) {
            Ok(line) => match buffer.accept(&line) {
                None => break,
                Some(Some(sql)) => {
                    editor.add_history_entry(sql.as_str()).ok();
                    report(run_statement(executor, &sql, format).await);
                }
                Some(None) => {}
            },
            Err(ReadlineError::Interrupted) => buffer.clear(),
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                return Err(RowscopeError::internal(format!("Failed to read input: {e}")));
            }
        }
    }

    if let Some(path) = &history {
        save_history(&mut editor, path);
    }
    Ok(())
}

/// Location of the prompt history file.
pub fn history_path() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::data_dir)
        .map(|dir| dir.join("rowscope").join("history"))
}

fn save_history(editor: &mut DefaultEditor, path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            debug!("Could not create history directory: {}", e);
            return;
        }
    }
    if let Err(e) = editor.save_history(path) {
        debug!("Could not save history: {}", e);
    }
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        eprintln!("{}: {}", e.category(), e);
    }
}
