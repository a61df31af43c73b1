#![forbid(unsafe_code)]

//! File Quarantine Helper (fqh) — scheduled filesystem hygiene for data
//! directories that accumulate exports, dumps, and rotated logs.
//!
//! One pass performs up to three phases, strictly in order:
//! 1. **Log truncation** (optional) — oversized "log" files are shrunk in
//!    place instead of quarantined
//! 2. **Quarantine sweep** — matured candidate files are relocated into a
//!    mirrored quarantine tree and made read-only
//! 3. **Expiry sweep** — quarantined files past retention are deleted
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use file_quarantine_helper::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use file_quarantine_helper::core::config::Config;
//! use file_quarantine_helper::sweep::run::{SweepConfig, SweepRunner};
//! ```

pub mod prelude;

#[cfg(feature = "cli")]
pub mod cli;
pub mod core;
pub mod logger;
pub mod report;
pub mod sweep;
