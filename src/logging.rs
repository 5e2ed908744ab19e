// 📝 Logging - tracing subscriber setup shared by both binaries
//
// The terminal UI owns the tty while it runs, so it logs to a file; the
// data check and the web server log to stderr.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Log file written next to the working directory while the TUI runs
pub const TUI_LOG_FILE: &str = "migration-dashboard.log";

/// Used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

/// `RUST_LOG` as given (so `RUST_LOG=debug` shows cache hits), else `info`
pub fn env_filter_from(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn env_filter() -> EnvFilter {
    env_filter_from(std::env::var("RUST_LOG").ok().as_deref())
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

pub fn init(target: &LogTarget) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());

    match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).init(),
        LogTarget::File(path) => builder
            .with_ansi(false)
            .with_writer(Mutex::new(open_log_file(path)?))
            .init(),
    }

    Ok(())
}
