//! CLI entry point for jsfetch.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use jsfetch_core::download::ProgressFn;
use jsfetch_core::{
    DownloadEngine, DownloadResult, HeaderSet, HttpClient, PathMapper, SourceUrl, load_url_file,
    report,
};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

/// Exit code when at least one download failed.
const EXIT_PARTIAL_FAILURE: u8 = 1;
/// Exit code for configuration errors (bad headers, bad URL file, bad output root).
const EXIT_CONFIG_ERROR: u8 = 2;
/// Exit code when the run was interrupted.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    debug!(?args, "CLI arguments parsed");

    // All configuration is validated before the first request goes out.
    let headers = HeaderSet::resolve(&args.headers, args.header_file.as_deref())
        .context("failed to resolve request headers")?;
    if args.verbose > 0 {
        for (name, value) in headers.masked_entries() {
            info!(header = %name, value = %value, "using custom header");
        }
    }

    let urls = load_url_file(&args.url_file).context("failed to load URL file")?;
    if urls.is_empty() {
        info!("no URLs found in input file");
        return Ok(ExitCode::SUCCESS);
    }
    let urls = if args.unique { dedup_urls(urls) } else { urls };

    info!(
        urls = urls.len(),
        output = %args.output.display(),
        concurrency = args.concurrency,
        headers = headers.len(),
        "starting download run"
    );

    // An unwritable output root fails the whole run here instead of once
    // per URL.
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("cannot create output directory {}", args.output.display()))?;

    let client = HttpClient::new(
        headers.to_header_map(),
        Duration::from_secs(args.timeout),
        usize::from(args.max_redirects),
    );
    let mapper = PathMapper::new(&args.output);
    let engine = DownloadEngine::new(usize::from(args.concurrency), client, mapper)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; aborting outstanding downloads");
            let _ = shutdown_tx.send(true);
        }
    });

    let progress_bar = (!args.quiet).then(|| {
        let bar = ProgressBar::new(urls.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    });
    let progress = progress_bar.clone().map(|bar| {
        Arc::new(move |result: &DownloadResult| {
            if !result.is_success() {
                bar.set_message(format!("last failure: {}", result.url));
            }
            bar.inc(1);
        }) as Arc<ProgressFn>
    });

    let summary = engine.run(urls, shutdown_rx.clone(), progress).await?;
    if let Some(bar) = progress_bar {
        bar.finish_and_clear();
    }

    // The summary is printed even on partial failure or interrupt.
    println!("{}", report::render_summary(&summary).trim_end());

    if let Some(path) = &args.report {
        report::write_json_report(&summary, path)
            .with_context(|| format!("cannot write JSON report to {}", path.display()))?;
        info!(path = %path.display(), "wrote JSON report");
    }
    if let Some(path) = &args.failed_out {
        report::write_failed_urls(&summary, path)
            .with_context(|| format!("cannot write failed-URL list to {}", path.display()))?;
        info!(path = %path.display(), "wrote failed-URL list");
    }

    if *shutdown_rx.borrow() {
        return Ok(ExitCode::from(EXIT_INTERRUPTED));
    }
    if summary.is_complete_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_PARTIAL_FAILURE))
    }
}

/// Drops duplicate URLs, keeping first occurrences in order.
fn dedup_urls(urls: Vec<SourceUrl>) -> Vec<SourceUrl> {
    let mut seen = std::collections::HashSet::new();
    let before = urls.len();
    let urls: Vec<SourceUrl> = urls
        .into_iter()
        .filter(|source| seen.insert(source.url().as_str().to_string()))
        .collect();
    if urls.len() < before {
        info!(removed = before - urls.len(), "removed duplicate URLs");
    }
    urls
}
