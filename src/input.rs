//! URL-list input: one absolute URL per line, validated before scheduling.

use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

/// A validated absolute URL from the input list.
///
/// Keeps the raw line text alongside the parsed form so results and reports
/// echo exactly what the caller wrote.
#[derive(Debug, Clone)]
pub struct SourceUrl {
    url: Url,
    raw: String,
}

/// Why a single input line was rejected.
#[derive(Debug, Error)]
pub enum SourceUrlError {
    /// The line does not parse as an absolute URL.
    #[error("invalid URL {url:?}: {source}")]
    Parse {
        /// The rejected line text.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// The URL scheme is not `http` or `https`.
    #[error("unsupported scheme {scheme:?} in {url:?} (only http and https)")]
    Scheme {
        /// The rejected line text.
        url: String,
        /// The scheme found.
        scheme: String,
    },
}

/// Errors raised while loading the URL list. Fatal: the run aborts before
/// any network activity.
#[derive(Debug, Error)]
pub enum InputError {
    /// URL file missing or unreadable.
    #[error("cannot read URL file {path}: {source}")]
    File {
        /// The URL file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A line failed validation.
    #[error("line {line}: {source}")]
    Line {
        /// 1-based line number in the URL file.
        line: usize,
        /// The per-line rejection.
        #[source]
        source: SourceUrlError,
    },
}

impl SourceUrl {
    /// Parses and validates one URL.
    ///
    /// # Errors
    ///
    /// Returns [`SourceUrlError`] when the text is not an absolute URL or
    /// uses a scheme other than `http`/`https`.
    pub fn parse(raw: &str) -> Result<Self, SourceUrlError> {
        let raw = raw.trim();
        let url = Url::parse(raw).map_err(|source| SourceUrlError::Parse {
            url: raw.to_string(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Self {
                url,
                raw: raw.to_string(),
            }),
            other => Err(SourceUrlError::Scheme {
                url: raw.to_string(),
                scheme: other.to_string(),
            }),
        }
    }

    /// The parsed URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URL as written in the input.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Loads and validates the URL file at `path`.
///
/// Blank lines and lines starting with `#` are ignored.
///
/// # Errors
///
/// Returns [`InputError::File`] when the file cannot be read and
/// [`InputError::Line`] (with the 1-based line number) for the first line
/// that fails validation.
pub fn load_url_file(path: &Path) -> Result<Vec<SourceUrl>, InputError> {
    let content = std::fs::read_to_string(path).map_err(|source| InputError::File {
        path: path.to_path_buf(),
        source,
    })?;
    parse_url_list(&content)
}

/// Parses newline-delimited URL-list content. See [`load_url_file`].
///
/// # Errors
///
/// Returns [`InputError::Line`] for the first invalid line.
pub fn parse_url_list(content: &str) -> Result<Vec<SourceUrl>, InputError> {
    let mut urls = Vec::new();
    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let source = SourceUrl::parse(line).map_err(|source| InputError::Line {
            line: index + 1,
            source,
        })?;
        urls.push(source);
    }
    Ok(urls)
}
