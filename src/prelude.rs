//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use file_quarantine_helper::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{FqhError, Result};
pub use crate::core::size::{format_size, parse_size};

// Sweep engine
pub use crate::sweep::classify::{Classifier, SkipReason, SweepAction};
pub use crate::sweep::executor::{ActionExecutor, ActionKind, ActionOutcome};
pub use crate::sweep::fsops::{FsOps, RealFs};
pub use crate::sweep::run::{RunState, SweepConfig, SweepRunner};
pub use crate::sweep::walker::{FileRecord, FileWalker, WalkerConfig};

// Report
pub use crate::report::RunReport;
pub use crate::report::notify::{JsonFileSink, ReportSink};

// Logging
pub use crate::logger::jsonl::{EventType, JsonlLogger, LogEntry, Severity};
