//! Bounded-concurrency download scheduler.
//!
//! The engine dispatches one fetch task per input URL, gated by a semaphore
//! so at most N fetches are in flight; this is the single point of
//! backpressure against target-server rate limits. Every URL, duplicates
//! included, produces exactly one [`DownloadResult`], delivered over a
//! results channel to a single aggregator that owns the [`RunSummary`].
//! A failed URL never aborts the batch, and there is no automatic retry.
//!
//! # Concurrency Model
//!
//! - Each fetch runs in its own Tokio task
//! - A semaphore permit is acquired before spawning each task
//! - Permits are released automatically when tasks complete (RAII)
//! - Workers push results onto an mpsc channel; one aggregator drains it,
//!   updates the shared atomic counters, and fires the progress callback
//! - Completion order is recorded as-is; it is not the input order

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Semaphore, mpsc, watch};
use tracing::{debug, info, instrument, warn};

use crate::input::SourceUrl;

use super::client::HttpClient;
use super::constants::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use super::path_map::PathMapper;
use super::result::{DownloadResult, DownloadStatus, RunSummary};

/// Callback fired by the aggregator after each completed URL.
pub type ProgressFn = dyn Fn(&DownloadResult) + Send + Sync;

/// Error type for scheduler operations.
///
/// Per-URL fetch failures are not errors at this level; they land in the
/// [`RunSummary`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,

    /// The result aggregator task failed.
    #[error("result aggregator failed: {0}")]
    Aggregator(#[source] tokio::task::JoinError),
}

/// Shared progress counters, safe for concurrent update and read.
///
/// Counters only ever reflect actually-completed URLs, never a race-prone
/// snapshot: the aggregator is the sole writer.
#[derive(Debug, Default)]
pub struct DownloadStats {
    processed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs that have produced a result so far.
    #[must_use]
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::SeqCst)
    }

    /// Successful fetches so far.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::SeqCst)
    }

    /// Failed fetches so far.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// URLs cancelled before completion.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    fn record(&self, result: &DownloadResult) {
        self.processed.fetch_add(1, Ordering::SeqCst);
        match result.status {
            DownloadStatus::Success => self.succeeded.fetch_add(1, Ordering::SeqCst),
            DownloadStatus::HttpError | DownloadStatus::NetworkError => {
                self.failed.fetch_add(1, Ordering::SeqCst)
            }
            DownloadStatus::Skipped => self.skipped.fetch_add(1, Ordering::SeqCst),
        };
    }
}

/// Bounded-concurrency scheduler: one fetch per URL, at most N in flight.
#[derive(Debug)]
pub struct DownloadEngine {
    client: HttpClient,
    mapper: Arc<PathMapper>,
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    stats: Arc<DownloadStats>,
}

impl DownloadEngine {
    /// Creates an engine with the given concurrency limit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    pub fn new(
        concurrency: usize,
        client: HttpClient,
        mapper: PathMapper,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(concurrency, "creating download engine");
        Ok(Self {
            client,
            mapper: Arc::new(mapper),
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            stats: Arc::new(DownloadStats::new()),
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Shared progress counters, readable while a run is in flight.
    #[must_use]
    pub fn stats(&self) -> Arc<DownloadStats> {
        Arc::clone(&self.stats)
    }

    /// Downloads every URL in `urls` and returns the aggregate summary.
    ///
    /// Duplicates in the input are each attempted independently. When the
    /// `shutdown` channel flips to `true`, undispatched URLs are recorded as
    /// `skipped`, in-flight fetches are aborted and their partial files
    /// removed, and the partial summary is still returned.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only for internal scheduler failures; a fetch
    /// failure is a [`DownloadResult`] in the summary, never an error here.
    #[instrument(skip_all, fields(url_count = urls.len()))]
    pub async fn run(
        &self,
        urls: Vec<SourceUrl>,
        shutdown: watch::Receiver<bool>,
        progress: Option<Arc<ProgressFn>>,
    ) -> Result<RunSummary, EngineError> {
        let total = urls.len();
        info!(total, concurrency = self.concurrency, "starting download batch");

        let (tx, mut rx) = mpsc::unbounded_channel::<DownloadResult>();

        let stats = Arc::clone(&self.stats);
        let aggregator = tokio::spawn(async move {
            let mut summary = RunSummary::new(total);
            while let Some(result) = rx.recv().await {
                stats.record(&result);
                if let Some(callback) = progress.as_deref() {
                    callback(&result);
                }
                summary.record(result);
            }
            summary
        });

        let mut handles = Vec::with_capacity(total);
        let mut dispatch_shutdown = shutdown.clone();
        for source in urls {
            if *dispatch_shutdown.borrow() {
                // Cancelled before dispatch: still exactly one result per URL.
                let _ = tx.send(DownloadResult::skipped(source.as_str()));
                continue;
            }

            let permit = tokio::select! {
                permit = Arc::clone(&self.semaphore).acquire_owned() => {
                    permit.map_err(|_| EngineError::SemaphoreClosed)?
                }
                () = wait_for_shutdown(&mut dispatch_shutdown) => {
                    let _ = tx.send(DownloadResult::skipped(source.as_str()));
                    continue;
                }
            };

            let client = self.client.clone();
            let mapper = Arc::clone(&self.mapper);
            let task_tx = tx.clone();
            let mut task_shutdown = shutdown.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let result = fetch_one(&client, &mapper, &source, &mut task_shutdown).await;
                let _ = task_tx.send(result);
            }));
        }
        drop(tx);

        debug!(task_count = handles.len(), "waiting for downloads to complete");
        for handle in handles {
            // Task panics are logged but don't fail the batch.
            if let Err(e) = handle.await {
                warn!(error = %e, "download task panicked");
            }
        }

        let summary = aggregator.await.map_err(EngineError::Aggregator)?;
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            bytes = summary.bytes_downloaded,
            "download batch complete"
        );
        Ok(summary)
    }
}

/// Fetches one URL, converting every failure into a result value.
async fn fetch_one(
    client: &HttpClient,
    mapper: &PathMapper,
    source: &SourceUrl,
    shutdown: &mut watch::Receiver<bool>,
) -> DownloadResult {
    if *shutdown.borrow() {
        return DownloadResult::skipped(source.as_str());
    }

    let dest = mapper.claim(source.url());
    tokio::select! {
        outcome = client.fetch_to_file(source.url(), &dest) => match outcome {
            Ok(bytes) => {
                debug!(url = %source.as_str(), path = %dest.display(), bytes, "download completed");
                DownloadResult::success(source.as_str(), dest, bytes)
            }
            Err(error) => {
                warn!(url = %source.as_str(), error = %error, "download failed");
                DownloadResult::failure(source.as_str(), &error)
            }
        },
        () = wait_for_shutdown(shutdown) => {
            // The in-flight request future was just dropped; drop any partial
            // output with it.
            let _ = tokio::fs::remove_file(&dest).await;
            DownloadResult::skipped(source.as_str())
        }
    }
}

/// Resolves once the shutdown flag flips to `true`; never resolves if the
/// sender is dropped without signalling.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
