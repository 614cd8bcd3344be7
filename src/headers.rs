//! Header-source merging: inline flags plus an optional header file.
//!
//! The effective header set is resolved once per run, before any network
//! activity, and shared read-only by every fetch task. Duplicate names are
//! all retained and all sent (some servers expect multi-value headers); when
//! a name appears both inline and in the file, the inline entry sorts first.
//! That is a documented policy decision, not last-wins merging.

use std::path::{Path, PathBuf};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;
use tracing::debug;

/// Substrings that mark a header value as sensitive for display purposes.
const SENSITIVE_NAME_PARTS: [&str; 5] = ["authorization", "token", "key", "secret", "cookie"];

/// Number of value characters left visible when masking.
const MASK_VISIBLE_CHARS: usize = 5;

/// Errors raised while resolving header configuration.
///
/// All of these abort the run before the first request is sent.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// Header file missing or unreadable.
    #[error("cannot read header file {path}: {source}")]
    Read {
        /// The header file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Header file parsed as JSON but is not an object.
    #[error("header file {path}: top-level JSON value must be an object of strings")]
    JsonNotObject {
        /// The header file path.
        path: PathBuf,
    },

    /// Header file parsed as a JSON object but a value is not a string.
    #[error("header file {path}: value for {name:?} must be a string")]
    JsonNonString {
        /// The header file path.
        path: PathBuf,
        /// The offending key.
        name: String,
    },

    /// A text-format header line has no `:` separator.
    #[error("header file {path} line {line}: missing ':' separator")]
    MissingSeparator {
        /// The header file path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
    },

    /// An inline `-H` flag has no `:` separator.
    #[error("header flag {flag:?}: expected \"Name: Value\"")]
    FlagMissingSeparator {
        /// The flag text as given.
        flag: String,
    },

    /// Header name or value contains CR or LF (header injection defense).
    #[error("header {name:?}: embedded CR/LF is not allowed")]
    EmbeddedNewline {
        /// The offending header name.
        name: String,
    },

    /// Header name is not a valid HTTP field name.
    #[error("invalid header name {name:?}")]
    InvalidName {
        /// The offending header name.
        name: String,
    },

    /// Header value cannot be represented on the wire.
    #[error("invalid value for header {name:?}")]
    InvalidValue {
        /// The header whose value was rejected.
        name: String,
    },
}

/// The effective, immutable header set for one run.
///
/// Holds both the ordered name/value pairs (for display and reporting) and
/// the pre-validated [`HeaderMap`] applied to every request.
#[derive(Debug, Clone)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
    map: HeaderMap,
}

impl HeaderSet {
    /// Merges inline `-H` flags and an optional header file into one set.
    ///
    /// Inline flags come first in the resulting order, then file entries.
    /// The file format is auto-detected: content that parses as JSON must be
    /// an object of string values; anything else is treated as `Name: Value`
    /// lines, with blank lines and `#` comments ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`HeaderError`] for an unreadable file, malformed JSON
    /// shape, a line or flag without `:`, embedded CR/LF, or a name/value
    /// the HTTP layer cannot represent.
    pub fn resolve(inline: &[String], header_file: Option<&Path>) -> Result<Self, HeaderError> {
        let mut entries = Vec::new();

        for flag in inline {
            let (name, value) =
                flag.split_once(':')
                    .ok_or_else(|| HeaderError::FlagMissingSeparator {
                        flag: flag.clone(),
                    })?;
            entries.push((name.trim().to_string(), value.trim().to_string()));
        }

        if let Some(path) = header_file {
            entries.extend(load_header_file(path)?);
        }

        let map = build_header_map(&entries)?;
        debug!(headers = entries.len(), "resolved header set");
        Ok(Self { entries, map })
    }

    /// Creates an empty header set.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            map: HeaderMap::new(),
        }
    }

    /// Ordered name/value pairs, inline flags first.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Number of headers in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no headers are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The validated header map to apply to every request. Duplicate names
    /// are appended, not replaced, so all values reach the wire.
    #[must_use]
    pub fn to_header_map(&self) -> HeaderMap {
        self.map.clone()
    }

    /// Entries with sensitive values masked, for verbose display.
    #[must_use]
    pub fn masked_entries(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(name, value)| {
                if is_sensitive_name(name) {
                    (name.clone(), mask_value(value))
                } else {
                    (name.clone(), value.clone())
                }
            })
            .collect()
    }
}

fn load_header_file(path: &Path) -> Result<Vec<(String, String)>, HeaderError> {
    let content = std::fs::read_to_string(path).map_err(|source| HeaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Object(object)) => {
            let mut entries = Vec::with_capacity(object.len());
            for (name, value) in object {
                let value = value.as_str().ok_or_else(|| HeaderError::JsonNonString {
                    path: path.to_path_buf(),
                    name: name.clone(),
                })?;
                entries.push((name, value.to_string()));
            }
            Ok(entries)
        }
        Ok(_) => Err(HeaderError::JsonNotObject {
            path: path.to_path_buf(),
        }),
        // Not JSON at all: fall back to "Name: Value" lines.
        Err(_) => parse_header_lines(path, &content),
    }
}

fn parse_header_lines(path: &Path, content: &str) -> Result<Vec<(String, String)>, HeaderError> {
    let mut entries = Vec::new();
    for (index, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| HeaderError::MissingSeparator {
                path: path.to_path_buf(),
                line: index + 1,
            })?;
        entries.push((name.trim().to_string(), value.trim().to_string()));
    }
    Ok(entries)
}

fn build_header_map(entries: &[(String, String)]) -> Result<HeaderMap, HeaderError> {
    let mut map = HeaderMap::new();
    for (name, value) in entries {
        if has_embedded_newline(name) || has_embedded_newline(value) {
            return Err(HeaderError::EmbeddedNewline { name: name.clone() });
        }
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|_| HeaderError::InvalidName {
                name: name.clone(),
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| HeaderError::InvalidValue {
                name: name.clone(),
            })?;
        map.append(header_name, header_value);
    }
    Ok(map)
}

fn has_embedded_newline(text: &str) -> bool {
    text.contains('\r') || text.contains('\n')
}

fn is_sensitive_name(name: &str) -> bool {
    let lowered = name.to_lowercase();
    SENSITIVE_NAME_PARTS
        .iter()
        .any(|part| lowered.contains(part))
}

fn mask_value(value: &str) -> String {
    let total = value.chars().count();
    if total > MASK_VISIBLE_CHARS {
        let visible: String = value.chars().take(MASK_VISIBLE_CHARS).collect();
        format!("{visible}{}", "*".repeat(total - MASK_VISIBLE_CHARS))
    } else {
        "*".repeat(total)
    }
}
