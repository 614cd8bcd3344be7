//! Concurrent download pipeline: URL-to-path mapping, fetch execution, and
//! the bounded scheduler that drives one fetch per input URL.
//!
//! # Overview
//!
//! [`PathMapper`] turns each URL into a collision-free location under the
//! output root. [`HttpClient`] performs a single GET with the resolved header
//! set and streams the body to disk. [`DownloadEngine`] fans the URL list out
//! across a semaphore-bounded set of tasks and aggregates one
//! [`DownloadResult`] per URL into a [`RunSummary`].
//!
//! # Example
//!
//! ```no_run
//! use jsfetch_core::download::{DownloadEngine, HttpClient, PathMapper};
//! use reqwest::header::HeaderMap;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(HeaderMap::new(), Duration::from_secs(30), 5);
//! let mapper = PathMapper::new("./js_files");
//! let engine = DownloadEngine::new(10, client, mapper)?;
//! let urls = jsfetch_core::parse_url_list("https://example.com/app.js")?;
//! let (_tx, rx) = tokio::sync::watch::channel(false);
//! let summary = engine.run(urls, rx, None).await?;
//! println!("{} succeeded, {} failed", summary.succeeded, summary.failed);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod engine;
mod error;
mod path_map;
mod result;

pub use client::HttpClient;
pub use constants::{DEFAULT_CONCURRENCY, DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS};
pub use engine::{DownloadEngine, DownloadStats, EngineError, ProgressFn};
pub use error::DownloadError;
pub use path_map::PathMapper;
pub use result::{DownloadResult, DownloadStatus, RunSummary};
