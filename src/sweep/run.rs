//! Run orchestrator: drives one maintenance pass through its phases.
//!
//! A pass is a strict sequence — truncation (optional), quarantine, expiry —
//! with no overlap between phases. Within a phase, files stream from the
//! walker into a worker pool; outcomes fold into one shared report.
//! `run` consumes the runner, so a pass can never be re-entered.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use parking_lot::Mutex;

use crate::core::config::Config;
use crate::core::errors::{FqhError, Result};
use crate::core::paths::quarantine_destination;
use crate::logger::jsonl::{EventType, JsonlLogger, LogEntry, Severity};
use crate::report::RunReport;
use crate::sweep::classify::{Classifier, SweepAction};
use crate::sweep::executor::{ActionExecutor, ActionKind, ActionOutcome};
use crate::sweep::fsops::FsOps;
use crate::sweep::walker::{FileRecord, FileWalker, WalkerConfig};

// ──────────────────── state machine ────────────────────

/// Phase of a maintenance pass. Transitions are strictly forward; the
/// truncation phase is absent entirely when truncation is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    TruncatingLogs,
    QuarantiningFiles,
    ExpiringOld,
    ReportReady,
    Done,
}

impl RunState {
    /// Legal forward transitions. `Idle -> QuarantiningFiles` covers runs
    /// with truncation disabled.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::TruncatingLogs)
                | (Self::Idle, Self::QuarantiningFiles)
                | (Self::TruncatingLogs, Self::QuarantiningFiles)
                | (Self::QuarantiningFiles, Self::ExpiringOld)
                | (Self::ExpiringOld, Self::ReportReady)
                | (Self::ReportReady, Self::Done)
        )
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::TruncatingLogs => "truncating_logs",
            Self::QuarantiningFiles => "quarantining_files",
            Self::ExpiringOld => "expiring_old",
            Self::ReportReady => "report_ready",
            Self::Done => "done",
        }
    }
}

// ──────────────────── runner settings ────────────────────

/// Flattened per-run settings, derived from the validated [`Config`].
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub scan_roots: Vec<PathBuf>,
    pub quarantine_root: PathBuf,
    pub extensions: Vec<String>,
    pub retention_days: u64,
    pub min_file_age_minutes: u64,
    pub exclude_patterns: Vec<String>,
    pub truncate_logs: bool,
    pub truncate_size_bytes: u64,
    pub dry_run: bool,
    pub parallelism: usize,
}

impl SweepConfig {
    /// Derive run settings from a loaded config.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self {
            scan_roots: cfg.sweep.scan_roots.clone(),
            quarantine_root: cfg.sweep.quarantine_root.clone(),
            extensions: cfg.sweep.extensions.clone(),
            retention_days: cfg.sweep.retention_days,
            min_file_age_minutes: cfg.sweep.min_file_age_minutes,
            exclude_patterns: cfg.sweep.exclude_patterns.clone(),
            truncate_logs: cfg.truncation.enabled,
            truncate_size_bytes: cfg.truncate_size_bytes()?,
            dry_run: cfg.sweep.dry_run,
            parallelism: cfg.sweep.parallelism,
        })
    }

    /// Settings invariants re-checked at run start. The runner can be built
    /// directly in tests, bypassing config validation, so the gate lives
    /// here too.
    fn validate(&self) -> Result<()> {
        if self.scan_roots.is_empty() {
            return Err(FqhError::InvalidConfig {
                details: "no scan roots configured".to_string(),
            });
        }
        if self.extensions.is_empty() {
            return Err(FqhError::InvalidConfig {
                details: "no candidate extensions configured".to_string(),
            });
        }
        for root in &self.scan_roots {
            if root.starts_with(&self.quarantine_root)
                || self.quarantine_root.starts_with(root)
            {
                return Err(FqhError::ConfigConflict {
                    details: format!(
                        "scan root {} and quarantine root {} overlap",
                        root.display(),
                        self.quarantine_root.display()
                    ),
                });
            }
        }
        if self.parallelism == 0 {
            return Err(FqhError::InvalidConfig {
                details: "parallelism must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

// ──────────────────── the runner ────────────────────

/// Drives one maintenance pass. Consumed by [`SweepRunner::run`].
pub struct SweepRunner {
    config: SweepConfig,
    logger: JsonlLogger,
    cancel: Arc<AtomicBool>,
    state: RunState,
}

impl SweepRunner {
    #[must_use]
    pub fn new(config: SweepConfig, logger: JsonlLogger) -> Self {
        Self {
            config,
            logger,
            cancel: Arc::new(AtomicBool::new(false)),
            state: RunState::Idle,
        }
    }

    /// Flag checked between files and between phases. Set it from a signal
    /// handler to stop the pass at the next safe point.
    #[must_use]
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state.name(),
            next.name()
        );
        self.state = next;
        if matches!(
            next,
            RunState::TruncatingLogs | RunState::QuarantiningFiles | RunState::ExpiringOld
        ) {
            self.logger.log(
                &LogEntry::new(EventType::PhaseStart, Severity::Info).with_details(next.name()),
            );
        }
    }

    /// Execute the pass. Per-file failures are folded into the report; only
    /// configuration problems and an uncreatable quarantine root abort.
    pub fn run<F: FsOps>(mut self, fs: &F) -> Result<RunReport> {
        self.config.validate()?;

        self.logger.log(
            &LogEntry::new(EventType::RunStart, Severity::Info)
                .with_dry_run(self.config.dry_run),
        );

        // The quarantine root must exist before any move lands in it.
        if !self.config.dry_run {
            fs.mkdir_all(&self.config.quarantine_root)?;
        }

        for root in &self.config.scan_roots {
            if !root.is_dir() {
                self.logger.log(
                    &LogEntry::new(EventType::RootSkipped, Severity::Warning)
                        .with_path(root)
                        .with_details("scan root missing or not a directory"),
                );
            }
        }

        let classifier = Classifier::new(
            &self.config.extensions,
            &self.config.exclude_patterns,
            self.config.min_file_age_minutes,
            self.config.retention_days,
            self.config.truncate_logs,
            self.config.truncate_size_bytes,
        )?;

        let report = Mutex::new(RunReport::new(self.config.dry_run));

        if self.config.truncate_logs {
            self.advance(RunState::TruncatingLogs);
            if !self.cancelled() {
                self.run_phase(fs, &classifier, &report, Phase::Truncation);
            }
        }

        self.advance(RunState::QuarantiningFiles);
        if !self.cancelled() {
            self.run_phase(fs, &classifier, &report, Phase::Quarantine);
        }

        self.advance(RunState::ExpiringOld);
        if !self.cancelled() {
            self.run_phase(fs, &classifier, &report, Phase::Expiry);
        }

        self.advance(RunState::ReportReady);

        let mut report = report.into_inner();
        // Expired files can leave empty mirrored directories behind.
        if !self.config.dry_run && report.deleted_count > 0 {
            match fs.remove_empty_dirs(&self.config.quarantine_root) {
                Ok(pruned) if pruned > 0 => {
                    self.logger.log(
                        &LogEntry::new(EventType::EmptyDirsPruned, Severity::Info)
                            .with_path(&self.config.quarantine_root)
                            .with_details(format!("{pruned} directories removed")),
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    self.logger.log(
                        &LogEntry::new(EventType::ActionFailed, Severity::Warning)
                            .with_path(&self.config.quarantine_root)
                            .with_error_code(err.code())
                            .with_details(err.to_string()),
                    );
                }
            }
        }

        if self.cancelled() {
            self.logger
                .log(&LogEntry::new(EventType::Cancelled, Severity::Warning));
        }
        report.generated_at = chrono::Utc::now();

        self.advance(RunState::Done);
        self.logger.log(
            &LogEntry::new(EventType::RunComplete, Severity::Info)
                .with_dry_run(self.config.dry_run)
                .with_details(format!(
                    "scanned={} quarantined={} deleted={} truncated={} failed={}",
                    report.files_scanned,
                    report.quarantined_count,
                    report.deleted_count,
                    report.truncated_count,
                    report.failed_count
                )),
        );

        Ok(report)
    }

    /// Stream one phase's files through the worker pool.
    fn run_phase<F: FsOps>(
        &self,
        fs: &F,
        classifier: &Classifier,
        report: &Mutex<RunReport>,
        phase: Phase,
    ) {
        let roots = match phase {
            Phase::Truncation | Phase::Quarantine => self.config.scan_roots.clone(),
            Phase::Expiry => vec![self.config.quarantine_root.clone()],
        };
        let walker = FileWalker::new(WalkerConfig {
            roots,
            parallelism: self.config.parallelism,
        });
        let receiver = walker.stream();
        let executor = ActionExecutor::new(fs, self.config.dry_run);

        thread::scope(|scope| {
            for _ in 0..self.config.parallelism {
                let receiver = receiver.clone();
                let executor = &executor;
                scope.spawn(move || {
                    for file in receiver.iter() {
                        if self.cancelled() {
                            return;
                        }
                        report.lock().count_scanned();
                        if let Some(outcome) = self.apply(phase, classifier, executor, &file) {
                            self.log_outcome(&outcome);
                            report.lock().record(outcome);
                        }
                    }
                });
            }
        });

        self.logger.log(
            &LogEntry::new(EventType::PhaseComplete, Severity::Info)
                .with_details(phase.name()),
        );
    }

    /// Classify one file for `phase` and execute the decided action.
    fn apply<F: FsOps>(
        &self,
        phase: Phase,
        classifier: &Classifier,
        executor: &ActionExecutor<'_, F>,
        file: &FileRecord,
    ) -> Option<ActionOutcome> {
        let action = match phase {
            Phase::Truncation => classifier.truncation_decision(file),
            Phase::Quarantine => classifier.quarantine_decision(file),
            Phase::Expiry => classifier.expiry_decision(file),
        };
        match action {
            SweepAction::Skip(_) => None,
            SweepAction::Truncate => {
                Some(executor.execute_truncate(file, self.config.truncate_size_bytes))
            }
            SweepAction::Quarantine => {
                match quarantine_destination(&file.path, &self.config.quarantine_root) {
                    Ok(dest) => Some(executor.execute_quarantine(file, &dest)),
                    Err(err) => Some(failed_mapping(file, &err)),
                }
            }
            SweepAction::Delete => Some(executor.execute_delete(file)),
        }
    }

    fn log_outcome(&self, outcome: &ActionOutcome) {
        let entry = if outcome.succeeded {
            let event = match outcome.action {
                ActionKind::Truncate => EventType::FileTruncated,
                ActionKind::Quarantine => EventType::FileQuarantined,
                ActionKind::Delete => EventType::FileExpired,
            };
            LogEntry::new(event, Severity::Info)
                .with_path(&outcome.path)
                .with_size(outcome.size_before)
                .with_dry_run(self.config.dry_run)
        } else {
            let mut entry = LogEntry::new(EventType::ActionFailed, Severity::Error)
                .with_path(&outcome.path)
                .with_size(outcome.size_before);
            if let Some(code) = &outcome.error_code {
                entry = entry.with_error_code(code);
            }
            if let Some(message) = &outcome.error {
                entry = entry.with_details(message.clone());
            }
            entry
        };
        self.logger.log(&entry);
    }
}

/// Internal phase selector; separate from [`RunState`] so state bookkeeping
/// stays with the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Truncation,
    Quarantine,
    Expiry,
}

impl Phase {
    const fn name(self) -> &'static str {
        match self {
            Self::Truncation => "truncating_logs",
            Self::Quarantine => "quarantining_files",
            Self::Expiry => "expiring_old",
        }
    }
}

/// A file whose quarantine destination could not be derived. Recorded as a
/// failed outcome so it stays visible in the report.
fn failed_mapping(file: &FileRecord, err: &FqhError) -> ActionOutcome {
    ActionOutcome {
        action: ActionKind::Quarantine,
        path: file.path.clone(),
        destination: None,
        size_before: file.size_bytes,
        size_after: None,
        succeeded: false,
        error_code: Some(err.code().to_string()),
        error: Some(err.to_string()),
        at: chrono::Utc::now(),
    }
}
