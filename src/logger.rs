//! Leveled run log.
//!
//! Every backup run writes one plain-text log file. Each call appends a single line
//! `yyyy-MM-dd HH:mm:ss [LEVEL] message`; calls below the configured minimum level are
//! dropped. Write failures never reach the caller: they are reported on the diagnostic
//! channel (`tracing`) and counted so the run summary can mention them.

use chrono::Local;
use std::cell::Cell;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Severity of a log line, ordered `Debug < Info < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Error,
}

impl LogLevel {
    /// Parses a level name case-insensitively. Anything unrecognised is `Info`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appends level-tagged, timestamped lines to one log file.
#[derive(Debug)]
pub struct Logger {
    path: PathBuf,
    min_level: LogLevel,
    failures: Cell<usize>,
}

impl Logger {
    pub fn new(path: impl Into<PathBuf>, min_level: LogLevel) -> Self {
        Self {
            path: path.into(),
            min_level,
            failures: Cell::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of log lines that could not be written.
    pub fn failures(&self) -> usize {
        self.failures.get()
    }

    /// Appends one line if `level` is at or above the minimum level.
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        if level < self.min_level {
            return;
        }
        let message = message.as_ref();
        if let Err(e) = self.append(level, message) {
            self.failures.set(self.failures.get() + 1);
            tracing::warn!(
                log_file = %self.path.display(),
                error = %e,
                "failed to write log line: [{level}] {message}"
            );
        }
    }

    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    fn append(&self, level: LogLevel, message: &str) -> io::Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        write!(file, "{timestamp} [{level}] {message}{LINE_ENDING}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Error);
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(LogLevel::parse_lenient("Debug"), LogLevel::Debug);
        assert_eq!(LogLevel::parse_lenient("ERROR"), LogLevel::Error);
        assert_eq!(LogLevel::parse_lenient(" info "), LogLevel::Info);
        assert_eq!(LogLevel::parse_lenient("Warning"), LogLevel::Info);
        assert_eq!(LogLevel::parse_lenient(""), LogLevel::Info);
        assert_eq!(LogLevel::parse_lenient("verbose"), LogLevel::Info);
    }

    #[test]
    fn test_log_line_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        let logger = Logger::new(&path, LogLevel::Debug);
        logger.info("hello world");

        let content = fs::read_to_string(&path).unwrap();
        let line = content.lines().next().unwrap();
        // "yyyy-MM-dd HH:mm:ss" is 19 characters
        let (timestamp, rest) = line.split_at(19);
        assert!(chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").is_ok());
        assert_eq!(rest, " [INFO] hello world");
        assert!(content.ends_with(LINE_ENDING));
    }

    #[test]
    fn test_filters_below_min_level() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        let logger = Logger::new(&path, LogLevel::Info);
        logger.debug("hidden");
        logger.info("shown");
        logger.error("also shown");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("[INFO] shown"));
        assert!(lines[1].ends_with("[ERROR] also shown"));
    }

    #[test]
    fn test_appends_in_call_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.log");
        fs::write(&path, format!("existing{LINE_ENDING}")).unwrap();
        let logger = Logger::new(&path, LogLevel::Debug);
        for i in 0..5 {
            logger.debug(format!("line {i}"));
        }

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "existing");
        for i in 0..5 {
            assert!(lines[i + 1].ends_with(&format!("line {i}")));
        }
    }

    #[test]
    fn test_write_failure_is_counted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("run.log");
        let logger = Logger::new(&path, LogLevel::Debug);
        logger.info("lost");
        logger.debug("lost too");
        assert_eq!(logger.failures(), 2);
        assert!(!path.exists());
    }
}
