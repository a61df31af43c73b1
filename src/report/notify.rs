//! Report delivery sinks. Fire-and-forget: a failed delivery is logged by
//! the caller and never aborts or reruns the maintenance pass.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::core::errors::{FqhError, Result};
use crate::report::RunReport;

/// External consumer of the completed run report.
pub trait ReportSink {
    /// Hand over the completed report.
    fn deliver(&self, report: &RunReport) -> Result<()>;
}

/// Writes the serialized report as one JSON document to a file,
/// creating parent directories as needed.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ReportSink for JsonFileSink {
    fn deliver(&self, report: &RunReport) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| FqhError::io(parent, e))?;
        }
        let json = serde_json::to_vec_pretty(report)?;
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| FqhError::io(&self.path, e))?;
        file.write_all(&json).map_err(|e| FqhError::io(&self.path, e))?;
        file.write_all(b"\n").map_err(|e| FqhError::io(&self.path, e))
    }
}
