//! JSONL logger: append-only line-delimited JSON for agent-friendly log
//! consumption.
//!
//! Each line is a self-contained JSON object. Lines are assembled in memory
//! and written atomically via `write_all` to prevent interleaved partial
//! lines when the file is being tailed by another process.
//!
//! Fallback chain:
//! 1. Configured file path
//! 2. stderr with `[FQH-LOG]` prefix
//! 3. Silent discard (a hygiene pass must never crash for logging failures)

#![allow(missing_docs)]

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Severity level for log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Event types matching the fqh activity model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunStart,
    PhaseStart,
    PhaseComplete,
    RootSkipped,
    FileTruncated,
    FileQuarantined,
    FileExpired,
    ActionFailed,
    EmptyDirsPruned,
    ReportDelivered,
    ReportDeliveryFailed,
    RunComplete,
    Cancelled,
}

/// A single JSONL log entry — all fields optional except `ts`, `event`,
/// `severity`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    pub event: EventType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// Create a new entry stamped with the current UTC time.
    #[must_use]
    pub fn new(event: EventType, severity: Severity) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            event,
            severity,
            path: None,
            size: None,
            dry_run: None,
            error_code: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_string_lossy().to_string());
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    #[must_use]
    pub fn with_error_code(mut self, code: &str) -> Self {
        self.error_code = Some(code.to_string());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Append-only JSONL writer with stderr fallback.
#[derive(Debug, Clone)]
pub struct JsonlLogger {
    path: Option<PathBuf>,
}

impl JsonlLogger {
    /// Logger writing to `path`. An empty path disables file logging and
    /// routes everything to stderr.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        let path = (!path.as_os_str().is_empty()).then(|| path.to_path_buf());
        Self { path }
    }

    /// Logger that only writes to stderr (tests, ad-hoc runs).
    #[must_use]
    pub fn stderr_only() -> Self {
        Self { path: None }
    }

    /// Write one entry. Failures degrade down the fallback chain and are
    /// swallowed at the end.
    pub fn log(&self, entry: &LogEntry) {
        let Ok(mut line) = serde_json::to_string(entry) else {
            return;
        };
        line.push('\n');

        if let Some(path) = &self.path
            && append_line(path, &line).is_ok()
        {
            return;
        }

        let _ = write!(std::io::stderr(), "[FQH-LOG] {line}");
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn appends_one_json_object_per_line() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("activity.jsonl");
        let logger = JsonlLogger::new(&path);

        logger.log(&LogEntry::new(EventType::RunStart, Severity::Info).with_dry_run(true));
        logger.log(
            &LogEntry::new(EventType::FileQuarantined, Severity::Info)
                .with_path(Path::new("/data/a.sql"))
                .with_size(200),
        );

        let raw = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = raw.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: LogEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.event, EventType::RunStart);
        assert_eq!(first.dry_run, Some(true));

        let second: LogEntry = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.path.as_deref(), Some("/data/a.sql"));
        assert_eq!(second.size, Some(200));
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/deep/activity.jsonl");
        let logger = JsonlLogger::new(&path);

        logger.log(&LogEntry::new(EventType::RunComplete, Severity::Info));
        assert!(path.exists());
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let entry = LogEntry::new(EventType::PhaseStart, Severity::Info);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("path"));
        assert!(!json.contains("error_code"));
    }

    #[test]
    fn stderr_only_logger_never_panics() {
        let logger = JsonlLogger::stderr_only();
        logger.log(
            &LogEntry::new(EventType::ActionFailed, Severity::Error)
                .with_error_code("FQH-3001")
                .with_details("test"),
        );
    }
}
