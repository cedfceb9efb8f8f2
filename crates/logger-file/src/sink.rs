//! Diagnostic sinks for non-fatal rotation events

use std::fmt;
use std::fmt::Write as FmtWrite;
use std::sync::Arc;

use parking_lot::Mutex;

/// Severity of a diagnostic message
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Debug information
    Debug,
    /// Informational
    Info,
    /// Something unexpected that did not interrupt writing
    Warn,
    /// A failed operation
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Receives diagnostics the writer cannot return to a caller
pub trait DiagnosticSink: Send + Sync + 'static {
    /// Record a message
    fn log(&self, level: Level, message: &str);

    /// Record an error
    fn error(&self, message: &str) {
        self.log(Level::Error, message);
    }

    /// Record a debug message
    fn debug(&self, message: &str) {
        self.log(Level::Debug, message);
    }
}

/// Forwards diagnostics to `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::Debug => tracing::debug!(target: "proven_logger_file", "{message}"),
            Level::Info => tracing::info!(target: "proven_logger_file", "{message}"),
            Level::Warn => tracing::warn!(target: "proven_logger_file", "{message}"),
            Level::Error => tracing::error!(target: "proven_logger_file", "{message}"),
        }
    }
}

/// Discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpSink;

impl DiagnosticSink for NoOpSink {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Captures diagnostics in memory
#[derive(Clone, Debug)]
pub struct MemorySink {
    lines: Arc<Mutex<String>>,
    min_level: Level,
}

impl MemorySink {
    /// Create a sink capturing every level
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(String::new())),
            min_level: Level::Debug,
        }
    }

    /// Only capture messages at `level` or above
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// All captured lines, one `LEVEL message` per line
    #[must_use]
    pub fn logs(&self) -> String {
        self.lines.lock().clone()
    }

    /// Whether any captured line contains `text`
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.lines.lock().contains(text)
    }

    /// Drop everything captured so far
    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        if level < self.min_level {
            return;
        }
        let mut lines = self.lines.lock();
        let _ = writeln!(lines, "{level} {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_memory_sink_captures() {
        let sink = MemorySink::new();
        sink.error("rename failed");
        sink.debug("rotated");

        assert_eq!(sink.logs(), "ERROR rename failed\nDEBUG rotated\n");
        assert!(sink.contains("rename failed"));

        sink.clear();
        assert!(sink.logs().is_empty());
    }

    #[test]
    fn test_memory_sink_level_filter() {
        let sink = MemorySink::new().with_level(Level::Warn);
        sink.debug("hidden");
        sink.log(Level::Info, "hidden too");
        sink.log(Level::Warn, "shown");

        assert_eq!(sink.logs(), "WARN shown\n");
    }

    #[test]
    fn test_clones_share_buffer() {
        let sink = MemorySink::new();
        let shared: Arc<dyn DiagnosticSink> = Arc::new(sink.clone());
        shared.error("from clone");

        assert!(sink.contains("from clone"));
    }

    #[test]
    fn test_noop_sink() {
        let sink = NoOpSink;
        sink.error("goes nowhere");
    }

    #[traced_test]
    #[test]
    fn test_tracing_sink_forwards() {
        let sink = TracingSink;
        sink.error("failed to rename app.log");
        sink.debug("rotated app.log");

        assert!(logs_contain("failed to rename app.log"));
        assert!(logs_contain("rotated app.log"));
    }
}
