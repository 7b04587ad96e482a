//! # Awful News Archive
//!
//! A bulk historical news collection pipeline that retrieves articles from
//! the New York Times Article Search API, normalizes their deeply nested
//! and inconsistently present fields into flat records, and exports them as
//! CSV for downstream analysis.
//!
//! ## Usage
//!
//! ```sh
//! awful_news_archive -q immigration -b 18510101 -e 20250501 -r 1000 \
//!     -o historical_immigration_articles.csv
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Fetching**: Page through Article Search results for the query and
//!    date range (sequential, rate-limit aware, with retry/backoff)
//! 2. **Normalization**: Flatten each raw document into the fixed output
//!    schema, enforcing the required-field set
//! 3. **Aggregation**: Fold per-article outcomes under the strict or lenient
//!    batch policy
//! 4. **Output**: Write one CSV row per surviving article

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod batch;
mod cli;
mod client;
mod models;
mod normalize;
mod outputs;
mod utils;

use batch::{BatchPolicy, BatchProcessor, TracingSkipObserver};
use cli::Cli;
use client::ArticleSearchClient;
use normalize::ArticleNormalizer;
use outputs::csv;
use utils::{ensure_writable_dir, validate_compact_date};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_archive starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.query, ?args.output, strict = args.strict, "Parsed CLI arguments");

    for date in [&args.begin_date, &args.end_date].into_iter().flatten() {
        validate_compact_date(date)?;
    }

    // Early check: ensure the output location is writable
    let output_dir = match Path::new(&args.output).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.display().to_string(),
        _ => ".".to_string(),
    };
    if let Err(e) = ensure_writable_dir(&output_dir).await {
        error!(
            path = %output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // Validates the required-field set before any network traffic
    let normalizer = ArticleNormalizer::new(&args.required_fields)?;
    let client = ArticleSearchClient::new(&args.api_key, args.base_url.as_deref())?;

    // ---- Fetch articles ----
    let articles = client
        .search_articles(
            &args.query,
            args.begin_date.as_deref(),
            args.end_date.as_deref(),
            args.results,
            args.start_page,
        )
        .await?;
    info!(count = articles.len(), "Total articles to normalize");

    // ---- Normalize and aggregate ----
    let policy = if args.strict {
        BatchPolicy::Strict
    } else {
        BatchPolicy::Lenient
    };
    let processor = BatchProcessor::new(&normalizer, policy);
    let mut observer = TracingSkipObserver;

    let report = match processor.process(&articles, &mut observer) {
        Ok(report) => report,
        Err(e) => {
            error!(error = %e, "Batch aborted in strict mode; nothing was written");
            return Err(e.into());
        }
    };
    if let Some(first) = report.records.first() {
        debug!(columns = first.columns().count(), "Flat schema");
    }

    // ---- CSV output ----
    if let Err(e) = csv::write_articles(&report, &args.output).await {
        error!(path = %args.output, error = %e, "Failed writing CSV");
        return Err(e);
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        saved = report.records.len(),
        skipped = report.error_count,
        "Execution complete"
    );

    Ok(())
}
