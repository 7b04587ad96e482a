//! CSV export of processed article batches.
//!
//! Every exported file carries the same fixed header (the normalizer's
//! output catalog, in order), so runs are directly concatenable and loadable
//! into any tabular tool. `Null` cells render empty; nested structures
//! arrive already serialized as JSON strings by the normalizer.

use std::error::Error;

use tokio::fs;
use tracing::{info, instrument, warn};

use crate::models::BatchReport;
use crate::normalize::output_columns;

/// Write a [`BatchReport`] to a CSV file at `path`.
///
/// An empty report writes nothing, not even the header row.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn write_articles(report: &BatchReport, path: &str) -> Result<(), Box<dyn Error>> {
    if report.records.is_empty() {
        warn!("No articles to save");
        return Ok(());
    }

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(output_columns())?;
    for record in &report.records {
        writer.write_record(
            output_columns().map(|column| {
                record
                    .get(column)
                    .map(ToString::to_string)
                    .unwrap_or_default()
            }),
        )?;
    }

    let bytes = writer.into_inner()?;
    fs::write(path, bytes).await?;

    info!(rows = report.records.len(), "Wrote article CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{BatchPolicy, BatchProcessor, RecordingSkipObserver};
    use crate::normalize::ArticleNormalizer;
    use serde_json::json;

    async fn write_report(articles: &[serde_json::Value], path: &str) -> BatchReport {
        let normalizer = ArticleNormalizer::new(["_id"]).unwrap();
        let processor = BatchProcessor::new(&normalizer, BatchPolicy::Lenient);
        let mut observer = RecordingSkipObserver::default();
        let report = processor.process(articles, &mut observer).unwrap();
        write_articles(&report, path).await.unwrap();
        report
    }

    #[tokio::test]
    async fn test_write_articles_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.csv");
        let path = path.to_str().unwrap();

        write_report(
            &[
                json!({
                    "_id": "a1",
                    "headline": {"main": "First"},
                    "word_count": 12,
                    "keywords": [{"value": "politics"}, {"value": "elections"}]
                }),
                json!({"_id": "a2"}),
            ],
            path,
        )
        .await;

        let contents = std::fs::read_to_string(path).unwrap();
        let mut lines = contents.lines();

        let header = lines.next().unwrap();
        let expected_header = output_columns().collect::<Vec<_>>().join(",");
        assert_eq!(header, expected_header);
        assert!(header.starts_with("headline,headline_kicker,"));

        let first = lines.next().unwrap();
        assert!(first.starts_with("First,"));
        assert!(first.contains("politics,elections"));

        // second row: only _id present, every other cell empty
        let second = lines.next().unwrap();
        assert!(second.contains("a2"));
        assert!(lines.next().is_none());
    }

    #[tokio::test]
    async fn test_write_articles_skips_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        let path = path.to_str().unwrap();

        let report = write_report(&[], path).await;

        assert!(report.records.is_empty());
        assert!(!std::path::Path::new(path).exists());
    }
}
