//! Human-readable rendering of a completed run report.

use std::fmt::Write;
use std::path::Path;

use colored::Colorize;

use crate::core::size::format_size;
use crate::report::RunReport;
use crate::sweep::executor::ActionOutcome;

/// Render the end-of-run summary block printed by the CLI.
#[must_use]
pub fn render(report: &RunReport) -> String {
    let mut out = String::new();

    if report.dry_run {
        let _ = writeln!(out, "{}", "DRY RUN — no files were modified".yellow().bold());
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Sweep summary:");
    let _ = writeln!(out, "  Files scanned:  {}", report.files_scanned);
    let _ = writeln!(
        out,
        "  Quarantined:    {} ({})",
        report.quarantined_count,
        format_size(report.quarantined_bytes)
    );
    let _ = writeln!(
        out,
        "  Expired:        {} ({})",
        report.deleted_count,
        format_size(report.deleted_bytes)
    );
    let _ = writeln!(
        out,
        "  Logs truncated: {} ({} freed)",
        report.truncated_count,
        format_size(report.truncated_bytes_freed)
    );

    if report.failed_count > 0 {
        let _ = writeln!(
            out,
            "  Failures:       {}",
            report.failed_count.to_string().red().bold()
        );
        for outcome in report
            .quarantined
            .iter()
            .chain(&report.deleted)
            .chain(&report.truncated)
            .filter(|o| !o.succeeded)
        {
            let _ = writeln!(out, "    {}", describe_failure(outcome));
        }
    }

    out
}

fn describe_failure(outcome: &ActionOutcome) -> String {
    let code = outcome.error_code.as_deref().unwrap_or("?");
    let message = outcome.error.as_deref().unwrap_or("unknown error");
    format!(
        "{} {} — {message}",
        code.red(),
        truncate_path(&outcome.path, 50)
    )
}

fn truncate_path(path: &Path, max_len: usize) -> String {
    let s = path.to_string_lossy();
    if s.len() <= max_len {
        return s.to_string();
    }
    // Keep the tail; the cut must land on a char boundary or slicing panics.
    let mut start = s.len() - max_len.saturating_sub(3);
    while !s.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &s[start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn summary_mentions_all_counters() {
        let mut report = RunReport::new(false);
        report.files_scanned = 12;
        let text = render(&report);
        assert!(text.contains("Files scanned:  12"));
        assert!(text.contains("Quarantined"));
        assert!(text.contains("Expired"));
        assert!(text.contains("Logs truncated"));
        assert!(!text.contains("DRY RUN"));
    }

    #[test]
    fn dry_run_banner_is_shown() {
        let report = RunReport::new(true);
        assert!(render(&report).contains("DRY RUN"));
    }

    #[test]
    fn truncation_respects_multibyte_characters() {
        let name: String = "я".repeat(30);
        let path = PathBuf::from(format!("/plain9876/{name}.sql"));
        let shown = truncate_path(&path, 50);
        assert!(shown.starts_with("..."));
        assert!(shown.ends_with(".sql"));
        assert!(shown.len() <= 50);
    }

    #[test]
    fn failed_outcome_with_multibyte_path_renders() {
        let name: String = "я".repeat(35);
        let mut report = RunReport::new(false);
        report.record(ActionOutcome {
            action: crate::sweep::executor::ActionKind::Quarantine,
            path: PathBuf::from(format!("/plain9876{name}")),
            destination: None,
            size_before: 10,
            size_after: None,
            succeeded: false,
            error_code: Some("FQH-3001".to_string()),
            error: Some("permission denied".to_string()),
            at: chrono::Utc::now(),
        });

        let text = render(&report);
        assert!(text.contains("FQH-3001"));
        assert!(text.contains("permission denied"));
    }

    #[test]
    fn long_paths_are_truncated_from_the_left() {
        let path = PathBuf::from("/very/long/path/that/keeps/going/and/going/file.sql");
        let shown = truncate_path(&path, 20);
        assert_eq!(shown.len(), 20);
        assert!(shown.starts_with("..."));
        assert!(shown.ends_with("file.sql"));
    }
}
