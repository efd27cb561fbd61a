//! Tracing setup. Stdout carries results, so logs go to stderr or a file.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber, filtered by `RUST_LOG` (default `info`).
///
/// With `to_file`, logs are written to [`log_path`], truncated on each run.
/// If that file cannot be opened the logs stay on stderr.
pub fn init(to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match to_file.then(open_log_file).flatten() {
        Some(file) => builder.with_writer(file).with_ansi(false).init(),
        None => builder.with_writer(std::io::stderr).init(),
    }
}

fn open_log_file() -> Option<File> {
    let path = log_path();
    let opened = match path.parent() {
        Some(dir) => fs::create_dir_all(dir).and_then(|()| File::create(&path)),
        None => File::create(&path),
    };
    opened
        .map_err(|e| eprintln!("Warning: Could not open log file {}: {e}", path.display()))
        .ok()
}

/// `rowscope/rowscope.log` under the platform state directory, falling back
/// to the config directory and then the temp directory.
pub fn log_path() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::config_dir)
        .map(|dir| dir.join("rowscope").join("rowscope.log"))
        .unwrap_or_else(|| std::env::temp_dir().join("rowscope.log"))
}
