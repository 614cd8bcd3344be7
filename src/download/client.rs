//! HTTP fetch executor: one GET per URL, resolved headers applied, body
//! streamed to disk.
//!
//! The client is built once per run and cloned into every worker; clones
//! share the underlying connection pool. Non-2xx responses are not
//! persisted, and a failed write never leaves a truncated file behind.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::error::DownloadError;

/// HTTP client configured with the run's header set, timeout, and redirect
/// policy.
///
/// # Example
///
/// ```no_run
/// use jsfetch_core::download::HttpClient;
/// use reqwest::header::HeaderMap;
/// use std::path::Path;
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new(HeaderMap::new(), Duration::from_secs(30), 5);
/// let url = url::Url::parse("https://example.com/app.js")?;
/// let bytes = client
///     .fetch_to_file(&url, Path::new("./js_files/example.com/app.js"))
///     .await?;
/// println!("wrote {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a client that sends `headers` on every request, enforces
    /// `timeout` per request, and follows at most `max_redirects` redirects
    /// (`0` disables redirects entirely).
    ///
    /// # Panics
    ///
    /// Panics if the underlying HTTP client cannot be constructed (TLS
    /// backend initialization failure). This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(headers: HeaderMap, timeout: Duration, max_redirects: usize) -> Self {
        let redirect_policy = if max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(max_redirects)
        };
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .redirect(redirect_policy)
            .user_agent(default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Fetches `url` and writes the response body to `dest`, creating parent
    /// directories on demand.
    ///
    /// Returns the number of bytes written. The body is streamed, never held
    /// in memory whole, and written byte-for-byte: no transcoding, no
    /// stripping, so downstream scanners see exactly what the server sent.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when:
    /// - the request fails (`Network`, `Timeout`)
    /// - the server responds outside 2xx (`HttpStatus`; nothing is persisted)
    /// - a directory or the file cannot be written (`Io`; any partial output
    ///   is removed before returning)
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_to_file(&self, url: &Url, dest: &Path) -> Result<u64, DownloadError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DownloadError::io(parent, e))?;
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success response");
            return Err(DownloadError::http_status(url.as_str(), status.as_u16()));
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        let stream_result = stream_to_file(&mut file, response, url, dest).await;
        if stream_result.is_err() {
            debug!(path = %dest.display(), "cleaning up partial file after error");
            let _ = tokio::fs::remove_file(dest).await;
        }
        let bytes_written = stream_result?;

        debug!(bytes = bytes_written, path = %dest.display(), "fetch complete");
        Ok(bytes_written)
    }
}

/// Streams the response body to `file`, returning bytes written.
///
/// Extracted so the caller can remove the partial file on error.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &Url,
    dest: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| classify_request_error(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(dest, e))?;

    Ok(bytes_written)
}

fn classify_request_error(url: &Url, error: reqwest::Error) -> DownloadError {
    if error.is_timeout() {
        DownloadError::timeout(url.as_str())
    } else {
        DownloadError::network(url.as_str(), error)
    }
}

/// Identifying User-Agent sent when the caller's headers don't override it.
fn default_user_agent() -> String {
    format!("jsfetch/{}", env!("CARGO_PKG_VERSION"))
}
