//! Logging setup using tracing.
//!
//! The library crates only ever emit events through `tracing` macros; a
//! subscriber is installed here, once, by the binary. When no sink is
//! configured every log call is a no-op rather than an error.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse a log level from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Default)]
pub struct LogConfig {
    /// Whether to print logs to stderr.
    pub print: bool,
    /// Log level.
    pub level: LogLevel,
    /// Directory for the append-only log file (if any).
    pub dir: Option<PathBuf>,
}

/// Initialize logging with the given configuration.
///
/// This should be called once at application startup. With neither `print`
/// nor `dir` set, only the filter registry is installed and log calls go
/// nowhere.
pub fn init(config: LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let subscriber = tracing_subscriber::registry().with(filter);

    let file_layer = config.dir.as_deref().and_then(open_sink).map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(Arc::new(file))
    });

    let stderr_layer = config.print.then(|| {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
    });

    subscriber.with(file_layer).with(stderr_layer).init();
}

/// Open the append-only log file beneath `dir`, creating the directory as
/// needed. Returns `None` (and complains on stderr) when the sink cannot be
/// opened, so a misconfigured log directory degrades to no-op logging.
fn open_sink(dir: &Path) -> Option<std::fs::File> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("savepoint: cannot create log directory {}: {e}", dir.display());
        return None;
    }

    let path = dir.join("savepoint.log");
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("savepoint: cannot open log file {}: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_from_str() {
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("invalid"), None);
    }

    #[test]
    fn test_log_level_as_str() {
        assert_eq!(LogLevel::Debug.as_str(), "debug");
        assert_eq!(LogLevel::Error.as_str(), "error");
    }

    #[test]
    fn test_default_log_config() {
        let config = LogConfig::default();
        assert!(!config.print);
        assert_eq!(config.level, LogLevel::Info);
        assert!(config.dir.is_none());
    }

    #[test]
    fn test_open_sink_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        assert!(open_sink(&logs).is_some());
        assert!(logs.join("savepoint.log").exists());
    }
}
