//! FQH-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, FqhError>;

/// Top-level error type for File Quarantine Helper.
#[derive(Debug, Error)]
pub enum FqhError {
    #[error("[FQH-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[FQH-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[FQH-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[FQH-1004] conflicting configuration: {details}")]
    ConfigConflict { details: String },

    #[error("[FQH-1101] invalid size format: {input:?} (expected <number><B|KB|MB|GB>)")]
    InvalidSizeFormat { input: String },

    #[error("[FQH-2001] path is not absolute, cannot map into quarantine: {path}")]
    PathOutsideScan { path: PathBuf },

    #[error("[FQH-2002] path not found: {path}")]
    PathNotFound { path: PathBuf },

    #[error("[FQH-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[FQH-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[FQH-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl FqhError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "FQH-1001",
            Self::MissingConfig { .. } => "FQH-1002",
            Self::ConfigParse { .. } => "FQH-1003",
            Self::ConfigConflict { .. } => "FQH-1004",
            Self::InvalidSizeFormat { .. } => "FQH-1101",
            Self::PathOutsideScan { .. } => "FQH-2001",
            Self::PathNotFound { .. } => "FQH-2002",
            Self::Serialization { .. } => "FQH-2101",
            Self::Io { .. } => "FQH-3001",
            Self::Runtime { .. } => "FQH-3900",
        }
    }

    /// Whether the sweep may continue past this failure.
    ///
    /// Recoverable errors are recorded (failed outcome or warning) and the
    /// pass moves on; non-recoverable errors abort before any phase runs.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound { .. }
                | Self::Serialization { .. }
                | Self::Io { .. }
                | Self::Runtime { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for FqhError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for FqhError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
