//! Action executor: applies decided actions against the filesystem
//! capability, converting every per-file failure into a failed outcome.
//!
//! In dry-run mode no `FsOps` call is made at all; the executor returns the
//! identical computed outcome so reports have the same shape either way.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::{FqhError, Result};
use crate::sweep::fsops::FsOps;
use crate::sweep::walker::FileRecord;

/// Kind of executed (or simulated) action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Truncate,
    Quarantine,
    Delete,
}

/// Record of one decided-and-applied (or simulated) action on one file.
/// Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: ActionKind,
    pub path: PathBuf,
    /// Quarantine destination, when applicable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    pub size_before: u64,
    /// Remaining size after truncation; `None` for other actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_after: Option<u64>,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

impl ActionOutcome {
    fn success(action: ActionKind, file: &FileRecord) -> Self {
        Self {
            action,
            path: file.path.clone(),
            destination: None,
            size_before: file.size_bytes,
            size_after: None,
            succeeded: true,
            error_code: None,
            error: None,
            at: Utc::now(),
        }
    }

    fn failed(mut self, err: &FqhError) -> Self {
        self.succeeded = false;
        self.error_code = Some(err.code().to_string());
        self.error = Some(err.to_string());
        self
    }

    /// Bytes released by this outcome: the full size for deletes and
    /// quarantines, the trimmed tail for truncations.
    #[must_use]
    pub fn bytes_affected(&self) -> u64 {
        self.size_after
            .map_or(self.size_before, |after| self.size_before - after)
    }
}

/// Applies decided actions, respecting dry-run mode.
pub struct ActionExecutor<'a, F: FsOps> {
    fs: &'a F,
    dry_run: bool,
}

impl<'a, F: FsOps> ActionExecutor<'a, F> {
    pub fn new(fs: &'a F, dry_run: bool) -> Self {
        Self { fs, dry_run }
    }

    /// Whether this executor only simulates.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Shrink `file` to `threshold_bytes`, discarding trailing content.
    pub fn execute_truncate(&self, file: &FileRecord, threshold_bytes: u64) -> ActionOutcome {
        let mut outcome = ActionOutcome::success(ActionKind::Truncate, file);
        outcome.size_after = Some(threshold_bytes.min(file.size_bytes));

        if self.dry_run {
            return outcome;
        }
        match self.fs.truncate(&file.path, threshold_bytes) {
            Ok(()) => outcome,
            Err(err) => outcome.failed(&err),
        }
    }

    /// Relocate `file` to `dest` inside the quarantine tree and lock its
    /// permissions down.
    pub fn execute_quarantine(&self, file: &FileRecord, dest: &Path) -> ActionOutcome {
        let mut outcome = ActionOutcome::success(ActionKind::Quarantine, file);
        outcome.destination = Some(dest.to_path_buf());

        if self.dry_run {
            return outcome;
        }
        match self.quarantine_live(&file.path, dest) {
            Ok(()) => outcome,
            Err(err) => outcome.failed(&err),
        }
    }

    fn quarantine_live(&self, src: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            self.fs.mkdir_all(parent)?;
        }
        self.fs.move_file(src, dest)?;
        self.fs.set_read_only(dest)
    }

    /// Remove an expired quarantined file.
    pub fn execute_delete(&self, file: &FileRecord) -> ActionOutcome {
        let outcome = ActionOutcome::success(ActionKind::Delete, file);

        if self.dry_run {
            return outcome;
        }
        match self.fs.delete(&file.path) {
            Ok(()) => outcome,
            Err(err) => outcome.failed(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::fs;
    use std::time::SystemTime;
    use tempfile::TempDir;

    use crate::sweep::fsops::RealFs;

    /// Records every mutating call; used to prove dry-run purity.
    #[derive(Default)]
    pub(crate) struct RecordingFs {
        pub calls: Mutex<Vec<String>>,
    }

    impl FsOps for RecordingFs {
        fn truncate(&self, path: &Path, len: u64) -> Result<()> {
            self.calls.lock().push(format!("truncate {} {len}", path.display()));
            Ok(())
        }
        fn move_file(&self, src: &Path, dst: &Path) -> Result<()> {
            self.calls
                .lock()
                .push(format!("move {} {}", src.display(), dst.display()));
            Ok(())
        }
        fn delete(&self, path: &Path) -> Result<()> {
            self.calls.lock().push(format!("delete {}", path.display()));
            Ok(())
        }
        fn mkdir_all(&self, path: &Path) -> Result<()> {
            self.calls.lock().push(format!("mkdir_all {}", path.display()));
            Ok(())
        }
        fn set_read_only(&self, path: &Path) -> Result<()> {
            self.calls.lock().push(format!("set_read_only {}", path.display()));
            Ok(())
        }
        fn remove_empty_dirs(&self, root: &Path) -> Result<usize> {
            self.calls
                .lock()
                .push(format!("remove_empty_dirs {}", root.display()));
            Ok(0)
        }
    }

    fn record(path: &Path, size: u64) -> FileRecord {
        FileRecord {
            path: path.to_path_buf(),
            size_bytes: size,
            modified: SystemTime::UNIX_EPOCH,
            age_minutes: 0,
        }
    }

    #[test]
    fn truncate_outcome_reports_freed_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.log");
        fs::write(&path, vec![b'x'; 2048]).unwrap();

        let fs_ops = RealFs;
        let executor = ActionExecutor::new(&fs_ops, false);
        let outcome = executor.execute_truncate(&record(&path, 2048), 1024);

        assert!(outcome.succeeded);
        assert_eq!(outcome.size_before, 2048);
        assert_eq!(outcome.size_after, Some(1024));
        assert_eq!(outcome.bytes_affected(), 1024);
        assert_eq!(fs::metadata(&path).unwrap().len(), 1024);
    }

    #[test]
    fn truncate_failure_is_recorded_not_raised() {
        let tmp = TempDir::new().unwrap();
        let fs_ops = RealFs;
        let executor = ActionExecutor::new(&fs_ops, false);
        let gone = tmp.path().join("vanished.log");

        let outcome = executor.execute_truncate(&record(&gone, 2048), 1024);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.error_code.as_deref(), Some("FQH-3001"));
    }

    #[test]
    fn quarantine_creates_ancestors_moves_and_locks() {
        let fs_ops = RecordingFs::default();
        let executor = ActionExecutor::new(&fs_ops, false);
        let src = Path::new("/data/a.sql");
        let dest = Path::new("/q/data/a.sql");

        let outcome = executor.execute_quarantine(&record(src, 200), dest);
        assert!(outcome.succeeded);
        assert_eq!(outcome.destination.as_deref(), Some(dest));

        let calls = fs_ops.calls.lock();
        assert_eq!(
            calls.as_slice(),
            &[
                "mkdir_all /q/data".to_string(),
                "move /data/a.sql /q/data/a.sql".to_string(),
                "set_read_only /q/data/a.sql".to_string(),
            ]
        );
    }

    #[test]
    fn delete_outcome_counts_full_size() {
        let fs_ops = RecordingFs::default();
        let executor = ActionExecutor::new(&fs_ops, false);

        let outcome = executor.execute_delete(&record(Path::new("/q/old.bak"), 512));
        assert!(outcome.succeeded);
        assert_eq!(outcome.bytes_affected(), 512);
        assert_eq!(fs_ops.calls.lock().len(), 1);
    }

    #[test]
    fn dry_run_never_touches_fsops() {
        let fs_ops = RecordingFs::default();
        let executor = ActionExecutor::new(&fs_ops, true);
        let file = record(Path::new("/data/a.sql"), 200);

        let t = executor.execute_truncate(&file, 100);
        let q = executor.execute_quarantine(&file, Path::new("/q/data/a.sql"));
        let d = executor.execute_delete(&file);

        assert!(t.succeeded && q.succeeded && d.succeeded);
        assert_eq!(t.size_after, Some(100));
        assert!(
            fs_ops.calls.lock().is_empty(),
            "dry-run must not call any mutating primitive"
        );
    }

    #[test]
    fn truncate_caps_size_after_at_current_size() {
        let fs_ops = RecordingFs::default();
        let executor = ActionExecutor::new(&fs_ops, true);
        let outcome = executor.execute_truncate(&record(Path::new("/data/small.log"), 50), 100);
        assert_eq!(outcome.size_after, Some(50));
        assert_eq!(outcome.bytes_affected(), 0);
    }
}
