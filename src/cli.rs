//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use jsfetch_core::{DEFAULT_CONCURRENCY, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS};

/// Bulk-download JavaScript assets while preserving URL directory structure.
///
/// jsfetch reads a newline-delimited file of absolute URLs, fetches them
/// concurrently with a configurable header set, and mirrors each asset under
/// the output directory as `<host>/<path>`. File content is written
/// byte-for-byte so the tree can be fed to static scanners afterwards.
#[derive(Parser, Debug)]
#[command(name = "jsfetch")]
#[command(author, version, about)]
pub struct Args {
    /// File containing URLs to download (one per line; # starts a comment)
    pub url_file: PathBuf,

    /// Output directory root
    #[arg(short = 'o', long = "output", default_value = "./js_files")]
    pub output: PathBuf,

    /// Add a request header (format: "Name: Value"). Can be used multiple
    /// times; duplicate names are all sent, inline flags before file entries.
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Load headers from a file (JSON object or "Name: Value" per line)
    #[arg(long)]
    pub header_file: Option<PathBuf>,

    /// Maximum concurrent downloads (1-100)
    #[arg(short = 'c', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub concurrency: u8,

    /// Per-request timeout in seconds (1-600)
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub timeout: u64,

    /// Maximum redirects to follow per request (0 disables redirects)
    #[arg(long, default_value_t = DEFAULT_MAX_REDIRECTS as u8, value_parser = clap::value_parser!(u8).range(0..=20))]
    pub max_redirects: u8,

    /// Write a machine-readable JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Write failed URLs (one per line) to this path for re-running
    #[arg(long)]
    pub failed_out: Option<PathBuf>,

    /// Drop duplicate URLs before downloading
    #[arg(long)]
    pub unique: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["jsfetch", "urls.txt"]).unwrap();
        assert_eq!(args.url_file, PathBuf::from("urls.txt"));
        assert_eq!(args.output, PathBuf::from("./js_files"));
        assert_eq!(args.concurrency, 10); // DEFAULT_CONCURRENCY
        assert_eq!(args.timeout, 30); // DEFAULT_TIMEOUT_SECS
        assert_eq!(args.max_redirects, 5); // DEFAULT_MAX_REDIRECTS
        assert!(args.headers.is_empty());
        assert!(args.header_file.is_none());
        assert!(!args.unique);
        assert!(!args.quiet);
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_cli_url_file_is_required() {
        let result = Args::try_parse_from(["jsfetch"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_repeated_header_flags_accumulate() {
        let args = Args::try_parse_from([
            "jsfetch",
            "urls.txt",
            "-H",
            "X-Bug-Bounty: hunter123",
            "-H",
            "Authorization: Bearer token123",
        ])
        .unwrap();
        assert_eq!(
            args.headers,
            vec![
                "X-Bug-Bounty: hunter123".to_string(),
                "Authorization: Bearer token123".to_string()
            ]
        );
    }

    #[test]
    fn test_cli_header_file_flag() {
        let args =
            Args::try_parse_from(["jsfetch", "urls.txt", "--header-file", "headers.json"])
                .unwrap();
        assert_eq!(args.header_file, Some(PathBuf::from("headers.json")));
    }

    #[test]
    fn test_cli_concurrency_bounds() {
        let args = Args::try_parse_from(["jsfetch", "urls.txt", "-c", "1"]).unwrap();
        assert_eq!(args.concurrency, 1);
        let args = Args::try_parse_from(["jsfetch", "urls.txt", "-c", "100"]).unwrap();
        assert_eq!(args.concurrency, 100);

        let result = Args::try_parse_from(["jsfetch", "urls.txt", "-c", "0"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
        let result = Args::try_parse_from(["jsfetch", "urls.txt", "-c", "101"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_timeout_flag() {
        let args = Args::try_parse_from(["jsfetch", "urls.txt", "-t", "120"]).unwrap();
        assert_eq!(args.timeout, 120);

        let result = Args::try_parse_from(["jsfetch", "urls.txt", "-t", "0"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_max_redirects_zero_allowed() {
        // 0 disables redirect following rather than being invalid.
        let args = Args::try_parse_from(["jsfetch", "urls.txt", "--max-redirects", "0"]).unwrap();
        assert_eq!(args.max_redirects, 0);
    }

    #[test]
    fn test_cli_output_short_and_long_flags() {
        let args = Args::try_parse_from(["jsfetch", "urls.txt", "-o", "out"]).unwrap();
        assert_eq!(args.output, PathBuf::from("out"));
        let args = Args::try_parse_from(["jsfetch", "urls.txt", "--output", "out2"]).unwrap();
        assert_eq!(args.output, PathBuf::from("out2"));
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["jsfetch", "urls.txt", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_report_and_failed_out_flags() {
        let args = Args::try_parse_from([
            "jsfetch",
            "urls.txt",
            "--report",
            "report.json",
            "--failed-out",
            "failed.txt",
        ])
        .unwrap();
        assert_eq!(args.report, Some(PathBuf::from("report.json")));
        assert_eq!(args.failed_out, Some(PathBuf::from("failed.txt")));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["jsfetch", "--help"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["jsfetch", "--version"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayVersion
        );
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["jsfetch", "urls.txt", "--invalid-flag"]);
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::UnknownArgument
        );
    }
}
