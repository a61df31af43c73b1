//! Run report: the structured output of one maintenance pass.

#![allow(missing_docs)]

pub mod notify;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sweep::executor::{ActionKind, ActionOutcome};

/// Accumulated counters and per-file outcome records for one invocation.
///
/// Owned by the run orchestrator while the pass executes, then handed
/// read-only to the report sink. Counters move only on success; failed
/// outcomes stay visible in the lists and in `failed_count`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub generated_at: DateTime<Utc>,
    /// Files the walker handed to the classifier, across all phases.
    pub files_scanned: u64,

    pub quarantined_count: u64,
    pub quarantined_bytes: u64,
    pub deleted_count: u64,
    pub deleted_bytes: u64,
    pub truncated_count: u64,
    pub truncated_bytes_freed: u64,
    pub failed_count: u64,

    pub quarantined: Vec<ActionOutcome>,
    pub deleted: Vec<ActionOutcome>,
    pub truncated: Vec<ActionOutcome>,
}

impl RunReport {
    /// Fresh report for a starting run.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            generated_at: Utc::now(),
            files_scanned: 0,
            quarantined_count: 0,
            quarantined_bytes: 0,
            deleted_count: 0,
            deleted_bytes: 0,
            truncated_count: 0,
            truncated_bytes_freed: 0,
            failed_count: 0,
            quarantined: Vec::new(),
            deleted: Vec::new(),
            truncated: Vec::new(),
        }
    }

    /// Fold one executed outcome into the report.
    pub fn record(&mut self, outcome: ActionOutcome) {
        if outcome.succeeded {
            match outcome.action {
                ActionKind::Quarantine => {
                    self.quarantined_count += 1;
                    self.quarantined_bytes += outcome.bytes_affected();
                }
                ActionKind::Delete => {
                    self.deleted_count += 1;
                    self.deleted_bytes += outcome.bytes_affected();
                }
                ActionKind::Truncate => {
                    self.truncated_count += 1;
                    self.truncated_bytes_freed += outcome.bytes_affected();
                }
            }
        } else {
            self.failed_count += 1;
        }

        match outcome.action {
            ActionKind::Quarantine => self.quarantined.push(outcome),
            ActionKind::Delete => self.deleted.push(outcome),
            ActionKind::Truncate => self.truncated.push(outcome),
        }
    }

    /// Count one file seen by a sweep phase.
    pub fn count_scanned(&mut self) {
        self.files_scanned += 1;
    }

    /// Verify every byte counter equals the sum over its successful
    /// outcomes. Reports are built through `record`, so this holds by
    /// construction; tests assert it on every scenario.
    #[must_use]
    pub fn totals_consistent(&self) -> bool {
        let sum = |outcomes: &[ActionOutcome]| -> u64 {
            outcomes
                .iter()
                .filter(|o| o.succeeded)
                .map(ActionOutcome::bytes_affected)
                .sum()
        };
        self.quarantined_bytes == sum(&self.quarantined)
            && self.deleted_bytes == sum(&self.deleted)
            && self.truncated_bytes_freed == sum(&self.truncated)
    }
}
