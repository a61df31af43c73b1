//! Per-file decision engine for the three sweep phases.
//!
//! The classifier is state-free: given one `FileRecord` and the active
//! settings it returns the terminal action for that file in that phase.
//! Mutual exclusion between truncation and quarantine is enforced here —
//! while truncation is enabled, "log" files are invisible to the quarantine
//! sweep.

use std::collections::HashSet;

use crate::core::errors::Result;
use crate::sweep::exclude::ExcludeSet;
use crate::sweep::walker::FileRecord;

/// Extension routed to truncation instead of quarantine when enabled.
pub const LOG_EXTENSION: &str = "log";

/// Terminal action decided for one file in one sweep phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepAction {
    /// Leave the file untouched.
    Skip(SkipReason),
    /// Shrink the file in place to the truncation threshold.
    Truncate,
    /// Relocate the file into the mirrored quarantine tree.
    Quarantine,
    /// Remove the file from the quarantine tree (expiry).
    Delete,
}

/// Why a file was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Path matches an exclusion pattern.
    Excluded,
    /// "log" file handled by the truncation sweep instead.
    RoutedToTruncation,
    /// Extension is not in the configured candidate set.
    ExtensionNotConfigured,
    /// Younger than the minimum file age.
    TooYoung,
    /// Not a "log" file (truncation sweep only).
    NotLogFile,
    /// At or below the truncation size threshold.
    UnderSizeThreshold,
    /// Quarantined file still inside the retention window.
    WithinRetention,
}

/// Classifier settings, derived once per run from the validated config.
#[derive(Debug, Clone)]
pub struct Classifier {
    extensions: HashSet<String>,
    excludes: ExcludeSet,
    min_file_age_minutes: u64,
    retention_days: u64,
    truncate_logs: bool,
    truncate_size_bytes: u64,
}

impl Classifier {
    /// Build a classifier. Extensions are expected lowercase (config
    /// normalization guarantees this); exclusion patterns are compiled here.
    pub fn new(
        extensions: &[String],
        exclude_patterns: &[String],
        min_file_age_minutes: u64,
        retention_days: u64,
        truncate_logs: bool,
        truncate_size_bytes: u64,
    ) -> Result<Self> {
        Ok(Self {
            extensions: extensions.iter().cloned().collect(),
            excludes: ExcludeSet::new(exclude_patterns)?,
            min_file_age_minutes,
            retention_days,
            truncate_logs,
            truncate_size_bytes,
        })
    }

    /// Whether the truncation sweep runs at all.
    #[must_use]
    pub const fn truncation_enabled(&self) -> bool {
        self.truncate_logs
    }

    /// The configured truncation threshold in bytes.
    #[must_use]
    pub const fn truncate_size_bytes(&self) -> u64 {
        self.truncate_size_bytes
    }

    /// Truncation-sweep decision. Only "log" files are considered, and the
    /// minimum-age gate does not apply: an oversized log is shrunk even if
    /// freshly written.
    #[must_use]
    pub fn truncation_decision(&self, file: &FileRecord) -> SweepAction {
        if self.excludes.matches(&file.path) {
            return SweepAction::Skip(SkipReason::Excluded);
        }
        if file.extension().as_deref() != Some(LOG_EXTENSION) {
            return SweepAction::Skip(SkipReason::NotLogFile);
        }
        if file.size_bytes <= self.truncate_size_bytes {
            return SweepAction::Skip(SkipReason::UnderSizeThreshold);
        }
        SweepAction::Truncate
    }

    /// Quarantine-sweep decision.
    #[must_use]
    pub fn quarantine_decision(&self, file: &FileRecord) -> SweepAction {
        if self.excludes.matches(&file.path) {
            return SweepAction::Skip(SkipReason::Excluded);
        }
        let Some(ext) = file.extension() else {
            return SweepAction::Skip(SkipReason::ExtensionNotConfigured);
        };
        // A file must never be both truncated and quarantined in one run.
        if self.truncate_logs && ext == LOG_EXTENSION {
            return SweepAction::Skip(SkipReason::RoutedToTruncation);
        }
        if !self.extensions.contains(&ext) {
            return SweepAction::Skip(SkipReason::ExtensionNotConfigured);
        }
        if file.age_minutes < self.min_file_age_minutes {
            return SweepAction::Skip(SkipReason::TooYoung);
        }
        SweepAction::Quarantine
    }

    /// Expiry-sweep decision, applied only to files under the quarantine
    /// root. Age is whole days from mtime at check time; a move preserves
    /// mtime, so time spent before quarantine counts toward retention.
    #[must_use]
    pub fn expiry_decision(&self, file: &FileRecord) -> SweepAction {
        if file.age_days() >= self.retention_days {
            SweepAction::Delete
        } else {
            SweepAction::Skip(SkipReason::WithinRetention)
        }
    }
}
