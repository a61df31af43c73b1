//! Parallel directory walker streaming per-file records.
//!
//! The walker is the eyes of the sweep: it discovers regular files under the
//! configured roots and hands each one to the classifier as a `FileRecord`.
//! Symlinks are never followed; permission errors and vanished directories
//! are skipped gracefully. Each call to `stream` is an independent,
//! restartable traversal.

#![allow(missing_docs)]

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, SystemTime};

use crossbeam_channel as channel;

/// Walker configuration derived from the sweep settings.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    pub roots: Vec<PathBuf>,
    pub parallelism: usize,
}

/// One discovered regular file, consumed immediately by the classifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: SystemTime,
    /// Whole minutes since `modified`, measured at discovery time.
    pub age_minutes: u64,
}

impl FileRecord {
    /// Build a record from filesystem metadata, deriving age from `now`.
    #[must_use]
    pub fn from_metadata(path: PathBuf, meta: &fs::Metadata, now: SystemTime) -> Self {
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let age_minutes = now
            .duration_since(modified)
            .map_or(0, |age| age.as_secs() / 60);
        Self {
            path,
            size_bytes: meta.len(),
            modified,
            age_minutes,
        }
    }

    /// Whole days since `modified` (floor division).
    #[must_use]
    pub const fn age_days(&self) -> u64 {
        self.age_minutes / (60 * 24)
    }

    /// The file's final dot-suffix, lowercased.
    ///
    /// `app.log.1` has extension "1", not "log" — compound suffixes must be
    /// configured explicitly.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }
}

/// Item in the internal work queue: (directory_path, depth).
type WorkItem = (PathBuf, usize);

/// Bound on queued directories; overflow is processed inline by the
/// discovering worker, never dropped.
const WORK_QUEUE_CAPACITY: usize = 4096;

/// Parallel walker over a fixed set of roots.
///
/// Missing or unreadable roots are skipped silently; the orchestrator checks
/// root existence up front and logs the warning itself.
pub struct FileWalker {
    config: WalkerConfig,
}

impl FileWalker {
    pub fn new(config: WalkerConfig) -> Self {
        Self { config }
    }

    /// Collect all files under the roots (convenience over `stream`).
    pub fn walk(&self) -> Vec<FileRecord> {
        self.stream().into_iter().collect()
    }

    /// Stream file records as they are discovered.
    ///
    /// The walk runs in background threads; the returned receiver closes
    /// once every worker has drained the work queue.
    pub fn stream(&self) -> channel::Receiver<FileRecord> {
        let parallelism = self.config.parallelism.max(1);

        let (work_tx, work_rx) = channel::bounded::<WorkItem>(WORK_QUEUE_CAPACITY);
        let (result_tx, result_rx) = channel::unbounded::<FileRecord>();

        // Track in-flight work items so workers know when to stop.
        let in_flight = Arc::new(AtomicUsize::new(0));

        for root in &self.config.roots {
            let meta = match fs::symlink_metadata(root) {
                Ok(m) => m,
                Err(_) => continue,
            };
            if !meta.is_dir() {
                continue;
            }
            in_flight.fetch_add(1, Ordering::Release);
            let _ = work_tx.send((root.clone(), 0));
        }

        for _ in 0..parallelism {
            let work_rx = work_rx.clone();
            let work_tx = work_tx.clone();
            let result_tx = result_tx.clone();
            let in_flight = Arc::clone(&in_flight);

            thread::spawn(move || {
                walker_thread(&work_rx, &work_tx, &result_tx, &in_flight);
            });
        }

        result_rx
    }
}

/// Worker loop: pull directories from the work channel, emit file records,
/// enqueue subdirectories.
fn walker_thread(
    work_rx: &channel::Receiver<WorkItem>,
    work_tx: &channel::Sender<WorkItem>,
    result_tx: &channel::Sender<FileRecord>,
    in_flight: &AtomicUsize,
) {
    loop {
        match work_rx.recv_timeout(Duration::from_millis(50)) {
            Ok((dir_path, depth)) => {
                process_directory(&dir_path, depth, work_tx, result_tx, in_flight);
                in_flight.fetch_sub(1, Ordering::AcqRel);
            }
            Err(channel::RecvTimeoutError::Timeout) => {
                if in_flight.load(Ordering::Acquire) == 0 {
                    return;
                }
            }
            Err(channel::RecvTimeoutError::Disconnected) => return,
        }
    }
}

fn process_directory(
    dir_path: &Path,
    depth: usize,
    work_tx: &channel::Sender<WorkItem>,
    result_tx: &channel::Sender<FileRecord>,
    in_flight: &AtomicUsize,
) {
    let entries = match fs::read_dir(dir_path) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::PermissionDenied => return,
        Err(err) if err.kind() == ErrorKind::NotFound => return,
        Err(_) => return,
    };

    let now = SystemTime::now();

    for entry_result in entries {
        let Ok(entry) = entry_result else {
            continue;
        };
        let Ok(ft) = entry.file_type() else {
            continue;
        };

        // Symlinks are neither followed nor reported.
        if ft.is_symlink() {
            continue;
        }

        let child_path = entry.path();
        if ft.is_dir() {
            in_flight.fetch_add(1, Ordering::Release);
            // A blocking send could deadlock once every worker is a sender,
            // so on a full queue the subtree is walked inline instead.
            if let Err(err) = work_tx.try_send((child_path, depth + 1)) {
                let (dir, dir_depth) = err.into_inner();
                process_directory(&dir, dir_depth, work_tx, result_tx, in_flight);
                in_flight.fetch_sub(1, Ordering::AcqRel);
            }
            continue;
        }

        if let Ok(meta) = entry.metadata() {
            let _ = result_tx.send(FileRecord::from_metadata(child_path, &meta, now));
        }
    }
}
