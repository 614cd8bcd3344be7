//! URL-to-path mapping with traversal defense and collision disambiguation.
//!
//! Each URL maps to `<root>/<host>/<path...>` so assets from different
//! origins never share a directory. Mapped paths are sanitized per segment
//! and verified to stay inside the output root. When two URLs map to the
//! same location, the later claim receives a deterministic suffix derived
//! from the full URL, so repeated runs against the same input reproduce the
//! same tree.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use sha2::{Digest, Sha256};
use url::Url;

use super::constants::{DEFAULT_FILENAME, QUERY_SUFFIX_MAX_LEN};

/// Maps URLs to collision-free destinations under the output root.
///
/// The claim table is shared by all workers: two tasks that compute the same
/// base path race on [`claim`](Self::claim), and the loser is diverted to a
/// suffixed name instead of overwriting. Paths already on disk from earlier
/// runs count as claimed.
#[derive(Debug)]
pub struct PathMapper {
    root: PathBuf,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl PathMapper {
    /// Creates a mapper rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            claimed: Mutex::new(HashSet::new()),
        }
    }

    /// Returns the output root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Computes the base destination for `url`, before disambiguation.
    ///
    /// The result is always a descendant of the root: segments are sanitized
    /// and the containment is re-verified after joining, falling back to a
    /// hash-named file directly under the root if a hostile URL somehow
    /// produced an escaping path.
    #[must_use]
    pub fn map(&self, url: &Url) -> PathBuf {
        let base = self.root.join(relative_path_for(url));
        if is_descendant(&self.root, &base) {
            base
        } else {
            self.root.join(format!("{}.js", short_hash(url.as_str())))
        }
    }

    /// Claims a destination for `url`, diverting collisions.
    ///
    /// The first claim of a path wins it outright. A later URL mapping to the
    /// same path gets `stem-<hash>.ext` where the hash is derived from the
    /// full URL; exact duplicates of one URL within a run count upward from
    /// there (`-2`, `-3`, ...).
    pub fn claim(&self, url: &Url) -> PathBuf {
        let base = self.map(url);
        let mut claimed = self
            .claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if available(&claimed, &base) {
            claimed.insert(base.clone());
            return base;
        }

        let tag = short_hash(url.as_str());
        let tagged = with_suffix(&base, &tag);
        if available(&claimed, &tagged) {
            claimed.insert(tagged.clone());
            return tagged;
        }

        let mut counter: usize = 2;
        loop {
            let candidate = with_suffix(&base, &format!("{tag}-{counter}"));
            if available(&claimed, &candidate) {
                claimed.insert(candidate.clone());
                return candidate;
            }
            counter += 1;
        }
    }
}

fn available(claimed: &HashSet<PathBuf>, candidate: &Path) -> bool {
    !claimed.contains(candidate) && !candidate.exists()
}

/// Relative path for `url`: sanitized host directory, sanitized path
/// segments, defaulted filename and extension, query folded into the stem.
fn relative_path_for(url: &Url) -> PathBuf {
    let host = url.host_str().unwrap_or("unknown-host");
    let netloc = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let mut host_dir = sanitize_segment(&netloc);
    if host_dir.is_empty() {
        host_dir = "unknown-host".to_string();
    }

    let mut segments: Vec<String> = url
        .path_segments()
        .map(|parts| {
            parts
                .map(sanitize_segment)
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let is_directory = url.path().ends_with('/') || segments.is_empty();
    let file_name = if is_directory {
        DEFAULT_FILENAME.to_string()
    } else {
        segments.pop().unwrap_or_else(|| DEFAULT_FILENAME.to_string())
    };

    let file_name = match url.query() {
        Some(query) if !query.is_empty() => fold_query(&file_name, query),
        _ => file_name,
    };
    let file_name = ensure_extension(file_name);

    let mut relative = PathBuf::from(host_dir);
    for segment in &segments {
        relative.push(segment);
    }
    relative.push(file_name);
    relative
}

/// Replaces characters illegal on common filesystems and strips dot
/// segments that would hide the file or walk the tree.
fn sanitize_segment(segment: &str) -> String {
    let replaced: String = segment
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    replaced.trim_matches('.').to_string()
}

/// Folds the sanitized query string into the filename stem, so
/// `app.js?v=1` and `app.js?v=2` map to distinct files.
fn fold_query(file_name: &str, query: &str) -> String {
    let safe: String = query
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(QUERY_SUFFIX_MAX_LEN)
        .collect();
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => format!("{}_{safe}{}", &file_name[..pos], &file_name[pos..]),
        _ => format!("{file_name}_{safe}"),
    }
}

/// Appends `.js` when the filename carries no extension, keeping
/// extension-driven scanners downstream working.
fn ensure_extension(file_name: String) -> String {
    if Path::new(&file_name).extension().is_none() {
        format!("{file_name}.js")
    } else {
        file_name
    }
}

/// Inserts `-tag` before the extension: `app.js` -> `app-1a2b3c4d.js`.
fn with_suffix(path: &Path, tag: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tagged = match name.rfind('.') {
        Some(pos) if pos > 0 => format!("{}-{tag}{}", &name[..pos], &name[pos..]),
        _ => format!("{name}-{tag}"),
    };
    path.with_file_name(tagged)
}

/// First eight hex digits of the SHA-256 of `input`. Deterministic, so
/// rerunning the same URL set reproduces the same disambiguated names.
fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest
        .iter()
        .take(4)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// True when `path` is `root` plus only normal components.
fn is_descendant(root: &Path, path: &Path) -> bool {
    match path.strip_prefix(root) {
        Ok(rest) => rest
            .components()
            .all(|component| matches!(component, Component::Normal(_))),
        Err(_) => false,
    }
}
