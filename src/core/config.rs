//! Configuration system: TOML file + env var overrides + validated defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{FqhError, Result};
use crate::core::paths::is_within;
use crate::core::size::parse_size;
use crate::sweep::exclude::validate_glob_pattern;

/// Full fqh configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub sweep: SweepSection,
    pub truncation: TruncationSection,
    pub report: ReportSection,
}

/// Scan roots, quarantine placement, and selection thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SweepSection {
    /// Directories scanned for quarantine candidates. Order is preserved.
    pub scan_roots: Vec<PathBuf>,
    /// Root of the mirrored quarantine tree. Must not live under a scan root.
    pub quarantine_root: PathBuf,
    /// Candidate extensions, matched case-insensitively without leading dot.
    pub extensions: Vec<String>,
    /// Quarantined files with whole-day age >= this are expiry candidates.
    pub retention_days: u64,
    /// Files younger than this are never quarantined.
    pub min_file_age_minutes: u64,
    /// Shell-style glob patterns; matching files are invisible to the engine.
    pub exclude_patterns: Vec<String>,
    /// Worker threads for per-file classification and action application.
    pub parallelism: usize,
    /// Simulate: compute decisions and outcomes without mutating anything.
    pub dry_run: bool,
}

/// In-place log truncation instead of quarantine for "log" files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TruncationSection {
    /// When true, "log" files leave the quarantine candidate set and are
    /// truncated in place when oversized.
    pub enabled: bool,
    /// Size threshold as a human string ("5MB"); files at or below it are
    /// left untouched.
    pub max_size: String,
}

/// Report delivery and activity logging paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ReportSection {
    /// Append-only JSONL activity log. Empty disables file logging.
    pub jsonl_log: PathBuf,
    /// Optional JSON report sink; empty disables delivery.
    pub output_file: PathBuf,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            scan_roots: vec![PathBuf::from("/var/data/exports")],
            quarantine_root: PathBuf::from("/var/data/quarantine"),
            extensions: vec![
                "bak".to_string(),
                "sql".to_string(),
                "dump".to_string(),
                "tmp".to_string(),
            ],
            retention_days: 30,
            min_file_age_minutes: 60,
            exclude_patterns: Vec::new(),
            parallelism: std::thread::available_parallelism()
                .map_or(2, |n| n.get().saturating_div(2).max(1)),
            dry_run: false,
        }
    }
}

impl Default for TruncationSection {
    fn default() -> Self {
        Self {
            enabled: false,
            max_size: "5MB".to_string(),
        }
    }
}

impl Default for ReportSection {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!("[FQH-CONFIG] WARNING: HOME not set, falling back to /tmp for log paths");
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let data = home_dir.join(".local").join("share").join("fqh");
        Self {
            jsonl_log: data.join("activity.jsonl"),
            output_file: PathBuf::new(),
        }
    }
}

impl Config {
    /// Default configuration path (`~/.config/fqh/config.toml`).
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
        home_dir.join(".config").join("fqh").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default
    /// path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| FqhError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(FqhError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// The truncation threshold in bytes, parsed from `truncation.max_size`.
    pub fn truncate_size_bytes(&self) -> Result<u64> {
        parse_size(&self.truncation.max_size)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        set_env_bool("FQH_SWEEP_DRY_RUN", &mut self.sweep.dry_run)?;
        set_env_u64("FQH_SWEEP_RETENTION_DAYS", &mut self.sweep.retention_days)?;
        set_env_u64(
            "FQH_SWEEP_MIN_FILE_AGE_MINUTES",
            &mut self.sweep.min_file_age_minutes,
        )?;
        set_env_usize("FQH_SWEEP_PARALLELISM", &mut self.sweep.parallelism)?;
        set_env_bool("FQH_TRUNCATION_ENABLED", &mut self.truncation.enabled)?;
        if let Some(raw) = env_var("FQH_TRUNCATION_MAX_SIZE") {
            self.truncation.max_size = raw;
        }
        if let Some(raw) = env_var("FQH_REPORT_JSONL_LOG") {
            self.report.jsonl_log = PathBuf::from(raw);
        }
        if let Some(raw) = env_var("FQH_REPORT_OUTPUT_FILE") {
            self.report.output_file = PathBuf::from(raw);
        }
        Ok(())
    }

    /// Normalize for consistent comparison: trailing slashes stripped from
    /// roots, extensions lowercased with leading dots removed.
    fn normalize(&mut self) {
        for path in self
            .sweep
            .scan_roots
            .iter_mut()
            .chain(std::iter::once(&mut self.sweep.quarantine_root))
        {
            let s = path.to_string_lossy();
            if s.len() > 1
                && let Some(stripped) = s.strip_suffix('/')
            {
                *path = PathBuf::from(stripped);
            }
        }

        for ext in &mut self.sweep.extensions {
            *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.sweep.scan_roots.is_empty() {
            return Err(FqhError::InvalidConfig {
                details: "sweep.scan_roots must not be empty".to_string(),
            });
        }
        for root in &self.sweep.scan_roots {
            if !root.is_absolute() {
                return Err(FqhError::InvalidConfig {
                    details: format!("sweep.scan_roots entry must be absolute: {}", root.display()),
                });
            }
        }

        if self.sweep.extensions.is_empty() {
            return Err(FqhError::InvalidConfig {
                details: "sweep.extensions must not be empty".to_string(),
            });
        }
        if self.sweep.extensions.iter().any(String::is_empty) {
            return Err(FqhError::InvalidConfig {
                details: "sweep.extensions must not contain empty entries".to_string(),
            });
        }

        if !self.sweep.quarantine_root.is_absolute() {
            return Err(FqhError::InvalidConfig {
                details: format!(
                    "sweep.quarantine_root must be absolute: {}",
                    self.sweep.quarantine_root.display()
                ),
            });
        }

        // A quarantine root inside a scan root would make the quarantine
        // sweep reprocess its own output on the next pass; a scan root inside
        // the quarantine tree would let the expiry sweep eat live data.
        for root in &self.sweep.scan_roots {
            if is_within(&self.sweep.quarantine_root, root) {
                return Err(FqhError::ConfigConflict {
                    details: format!(
                        "quarantine_root {} is inside scan root {}",
                        self.sweep.quarantine_root.display(),
                        root.display()
                    ),
                });
            }
            if is_within(root, &self.sweep.quarantine_root) {
                return Err(FqhError::ConfigConflict {
                    details: format!(
                        "scan root {} is inside quarantine_root {}",
                        root.display(),
                        self.sweep.quarantine_root.display()
                    ),
                });
            }
        }

        if self.sweep.parallelism == 0 {
            return Err(FqhError::InvalidConfig {
                details: "sweep.parallelism must be >= 1".to_string(),
            });
        }

        // Reject a bad threshold up front rather than sweeping with a wrong one.
        self.truncate_size_bytes()?;

        for pattern in &self.sweep.exclude_patterns {
            validate_glob_pattern(pattern)?;
        }

        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env_bool(name: &str, slot: &mut bool) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<bool>().map_err(|error| FqhError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_u64(name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u64>().map_err(|error| FqhError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_usize(name: &str, slot: &mut usize) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw
            .parse::<usize>()
            .map_err(|error| FqhError::ConfigParse {
                context: "env",
                details: format!("{name}={raw:?}: {error}"),
            })?;
    }
    Ok(())
}
