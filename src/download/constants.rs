//! Constants for the download module (limits, timeouts, naming defaults).

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default number of concurrent in-flight fetches.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default per-request timeout in seconds (connect + body read).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default redirect-chain limit per request.
pub const DEFAULT_MAX_REDIRECTS: usize = 5;

/// Filename substituted when a URL path is empty or ends in `/`.
pub const DEFAULT_FILENAME: &str = "index.js";

/// Maximum length of the sanitized query-string fragment folded into a
/// mapped filename.
pub const QUERY_SUFFIX_MAX_LEN: usize = 50;
