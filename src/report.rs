//! Run-summary output: console text, machine-readable JSON, failed-URL list.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::download::RunSummary;

/// Errors raised while writing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Report destination cannot be written.
    #[error("cannot write report to {path}: {source}")]
    Io {
        /// The report path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The summary cannot be serialized.
    #[error("cannot serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Renders the human-readable completion summary.
///
/// Always rendered, including on partial failure and cancellation, so the
/// caller can see what happened before reading the exit code.
#[must_use]
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Download complete: {} succeeded, {} failed, {} skipped ({} attempted, {} bytes)",
        summary.succeeded,
        summary.failed,
        summary.skipped,
        summary.attempted,
        summary.bytes_downloaded
    );
    if !summary.failures.is_empty() {
        let _ = writeln!(out, "Failed URLs:");
        for failure in &summary.failures {
            let cause = failure.error.as_deref().unwrap_or("unknown cause");
            let _ = writeln!(out, "  [{}] {} - {}", failure.status, failure.url, cause);
        }
    }
    out
}

/// Writes the summary as pretty-printed JSON to `path`.
///
/// # Errors
///
/// Returns [`ReportError`] if serialization or the write fails.
pub fn write_json_report(summary: &RunSummary, path: &Path) -> Result<(), ReportError> {
    let body = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, body).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes failed URLs, one per line, so a subset can be re-run.
///
/// # Errors
///
/// Returns [`ReportError`] if the write fails.
pub fn write_failed_urls(summary: &RunSummary, path: &Path) -> Result<(), ReportError> {
    let mut body = String::new();
    for failure in &summary.failures {
        let _ = writeln!(body, "{}", failure.url);
    }
    std::fs::write(path, body).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}
