//! Batch processing over sequences of raw articles.
//!
//! [`BatchProcessor`] drives the normalizer across a page-ordered batch and
//! folds the per-record outcomes into a [`BatchReport`] according to the
//! configured [`BatchPolicy`]:
//!
//! - **Strict**: the first failing record aborts the whole batch; the error
//!   propagates and no report is produced.
//! - **Lenient**: failing records are skipped and counted; processing
//!   continues and the report satisfies
//!   `records.len() + error_count == input.len()`.
//!
//! Skips are reported through an injected [`SkipObserver`] rather than a
//! process-wide logger, so the batch core stays free of logging configuration
//! and tests can assert on notifications directly.

use serde_json::Value;
use tracing::{info, warn};

use crate::models::BatchReport;
use crate::normalize::{ArticleNormalizer, NormalizeError};

/// Failure policy for one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Abort on the first record failure.
    Strict,
    /// Skip failing records, count them, and continue.
    Lenient,
}

/// Receives one notification per record skipped in lenient mode.
pub trait SkipObserver {
    /// Called with the record's position in the input batch, its identifier,
    /// and the failure that caused the skip.
    fn on_skip(&mut self, index: usize, article_id: &str, reason: &NormalizeError);
}

/// Production observer: one structured warning per skipped record.
#[derive(Debug, Default)]
pub struct TracingSkipObserver;

impl SkipObserver for TracingSkipObserver {
    fn on_skip(&mut self, index: usize, article_id: &str, reason: &NormalizeError) {
        warn!(index, article_id, reason = %reason, "Skipping article");
    }
}

/// Test observer that records every notification it receives.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSkipObserver {
    /// `(index, article_id, reason)` per skip, in skip order.
    pub skips: Vec<(usize, String, String)>,
}

#[cfg(test)]
impl SkipObserver for RecordingSkipObserver {
    fn on_skip(&mut self, index: usize, article_id: &str, reason: &NormalizeError) {
        self.skips
            .push((index, article_id.to_string(), reason.to_string()));
    }
}

/// Processes batches of raw articles through a shared normalizer.
#[derive(Debug)]
pub struct BatchProcessor<'a> {
    normalizer: &'a ArticleNormalizer,
    policy: BatchPolicy,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(normalizer: &'a ArticleNormalizer, policy: BatchPolicy) -> Self {
        Self { normalizer, policy }
    }

    /// Normalize every article in input order.
    ///
    /// In strict mode the first failure is returned and the partially built
    /// report is dropped; nothing of the batch is observable to the caller.
    /// In lenient mode every failure is counted, reported to `observer`, and
    /// skipped.
    pub fn process(
        &self,
        articles: &[Value],
        observer: &mut dyn SkipObserver,
    ) -> Result<BatchReport, NormalizeError> {
        let mut records = Vec::with_capacity(articles.len());
        let mut error_count = 0usize;

        for (index, article) in articles.iter().enumerate() {
            match self.normalizer.normalize(article) {
                Ok(flat) => records.push(flat),
                Err(e) => {
                    error_count += 1;
                    if self.policy == BatchPolicy::Strict {
                        return Err(e);
                    }
                    observer.on_skip(index, e.article_id(), &e);
                }
            }
        }

        info!(
            processed = records.len(),
            errors = error_count,
            "Processed article batch"
        );
        Ok(BatchReport {
            records,
            error_count,
        })
    }
}
