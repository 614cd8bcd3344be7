//! Per-URL outcomes and the aggregate run summary.

use std::path::PathBuf;

use serde::Serialize;

use super::error::DownloadError;

/// Classification of a single fetch outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    /// 2xx response, body written to disk.
    Success,
    /// Non-2xx response; nothing persisted.
    HttpError,
    /// Connect, TLS, DNS, timeout, or local write failure.
    NetworkError,
    /// Cancelled before completion (run interrupted).
    Skipped,
}

impl std::fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Success => "success",
            Self::HttpError => "http_error",
            Self::NetworkError => "network_error",
            Self::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// Outcome of one fetch. Created once by the worker, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadResult {
    /// The input URL, as written in the URL file.
    pub url: String,
    /// Where the body was written, when it was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Outcome classification.
    pub status: DownloadStatus,
    /// Numeric HTTP status for `http_error` outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Bytes written to disk.
    pub bytes: u64,
    /// Human-readable cause for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DownloadResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(url: impl Into<String>, path: PathBuf, bytes: u64) -> Self {
        Self {
            url: url.into(),
            path: Some(path),
            status: DownloadStatus::Success,
            http_status: None,
            bytes,
            error: None,
        }
    }

    /// Creates a failed result from a fetch error.
    ///
    /// Non-2xx responses map to `http_error`; everything else (including
    /// local filesystem failures) maps to `network_error` with the cause
    /// preserved in `error`.
    #[must_use]
    pub fn failure(url: impl Into<String>, error: &DownloadError) -> Self {
        let status = match error {
            DownloadError::HttpStatus { .. } => DownloadStatus::HttpError,
            _ => DownloadStatus::NetworkError,
        };
        Self {
            url: url.into(),
            path: None,
            status,
            http_status: error.status_code(),
            bytes: 0,
            error: Some(error.to_string()),
        }
    }

    /// Creates a skipped result for a URL the run was cancelled under.
    #[must_use]
    pub fn skipped(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: None,
            status: DownloadStatus::Skipped,
            http_status: None,
            bytes: 0,
            error: None,
        }
    }

    /// Returns true for `success` outcomes.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == DownloadStatus::Success
    }
}

/// Aggregate counts and the failure list for one download batch.
///
/// Failures are recorded in completion order, which is not the input order;
/// consumers must not assume otherwise.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    /// Number of URLs handed to the scheduler.
    pub attempted: usize,
    /// Fetches that wrote a file.
    pub succeeded: usize,
    /// Fetches that ended in `http_error` or `network_error`.
    pub failed: usize,
    /// URLs cancelled before completion.
    pub skipped: usize,
    /// Total bytes written across all successful fetches.
    pub bytes_downloaded: u64,
    /// Failed results, in completion order.
    pub failures: Vec<DownloadResult>,
}

impl RunSummary {
    /// Creates an empty summary for a batch of `attempted` URLs.
    #[must_use]
    pub fn new(attempted: usize) -> Self {
        Self {
            attempted,
            succeeded: 0,
            failed: 0,
            skipped: 0,
            bytes_downloaded: 0,
            failures: Vec::new(),
        }
    }

    /// Folds one completed result into the summary.
    pub fn record(&mut self, result: DownloadResult) {
        match result.status {
            DownloadStatus::Success => {
                self.succeeded += 1;
                self.bytes_downloaded += result.bytes;
            }
            DownloadStatus::HttpError | DownloadStatus::NetworkError => {
                self.failed += 1;
                self.failures.push(result);
            }
            DownloadStatus::Skipped => self.skipped += 1,
        }
    }

    /// True when every attempted URL succeeded.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0
    }

    /// Number of results recorded so far.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}
