//! Incremental load cycle
//!
//! One [`DataLoader::load`] call reads every source object modified since the
//! last confirmed bookmark, unions them into a single [`Dataset`] and records
//! the newest object's timestamp as `IN_PROGRESS`. Nothing is written when
//! there is nothing new or when any payload fails to read.

use std::sync::Arc;
use std::time::Duration;

use bookmark_common::{BookmarkStatus, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::aws::AwsClients;
use crate::bookmark::{Bookmarks, JobProgress};
use crate::config::LoaderConfig;
use crate::dataset::Dataset;
use crate::ledger::{
    ensure_store, DynamoLedger, KeySchema, LedgerClient, DEFAULT_PROVISION_TIMEOUT,
};
use crate::source::{PayloadReader, S3Source, SourceItem, SourceLister};

/// Result of one load cycle
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// Union of every newly selected payload
    pub dataset: Dataset,
    /// Objects that were read, newest first
    pub items: Vec<SourceItem>,
    /// Watermark recorded as `IN_PROGRESS`, `None` when nothing was new
    pub new_progress: Option<i64>,
    /// Confirmed watermark the selection started from
    pub previous_progress: i64,
}

impl LoadOutcome {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn summary(&self) -> LoadSummary {
        LoadSummary {
            files: self.items.len(),
            rows: self.dataset.len(),
            columns: self.dataset.columns().len(),
            previous_progress: self.previous_progress,
            new_progress: self.new_progress,
        }
    }
}

/// Printable summary of a [`LoadOutcome`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub files: usize,
    pub rows: usize,
    pub columns: usize,
    pub previous_progress: i64,
    pub new_progress: Option<i64>,
}

pub struct DataLoader {
    config: LoaderConfig,
    ledger: Arc<dyn LedgerClient>,
    bookmarks: Bookmarks,
    lister: Arc<dyn SourceLister>,
    reader: Arc<dyn PayloadReader>,
}

impl DataLoader {
    /// Wire a loader from its collaborators. Performs no I/O.
    pub fn new(
        config: LoaderConfig,
        ledger: Arc<dyn LedgerClient>,
        lister: Arc<dyn SourceLister>,
        reader: Arc<dyn PayloadReader>,
    ) -> Self {
        let bookmarks = Bookmarks::new(ledger.clone(), &config);
        Self {
            config,
            ledger,
            bookmarks,
            lister,
            reader,
        }
    }

    /// Loader backed by S3 and DynamoDB.
    pub fn from_clients(config: LoaderConfig, clients: &AwsClients) -> Self {
        let source = Arc::new(S3Source::new(clients.s3.clone(), config.source.bucket.clone()));
        let ledger = Arc::new(DynamoLedger::new(clients.dynamodb.clone()));
        Self::new(config, ledger, source.clone(), source)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn bookmarks(&self) -> &Bookmarks {
        &self.bookmarks
    }

    /// Make sure the ledger table exists with the bookmark key schema and is
    /// ready for use, creating it if needed.
    pub async fn initialize(&self) -> Result<()> {
        self.initialize_with_timeout(DEFAULT_PROVISION_TIMEOUT).await
    }

    pub async fn initialize_with_timeout(&self, timeout: Duration) -> Result<()> {
        ensure_store(
            self.ledger.as_ref(),
            &self.config.ledger_table,
            &KeySchema::bookmark(),
            timeout,
        )
        .await
    }

    /// Run one load cycle.
    #[instrument(
        skip(self),
        fields(job = %self.config.job_name, source = %self.config.source.uri())
    )]
    pub async fn load(&self) -> Result<LoadOutcome> {
        let confirmed = self.bookmarks.query_confirmed_progress().await?;
        let listed = self.lister.list(&self.config.source.prefix).await?;
        debug!(listed = listed.len(), confirmed, "Listed source objects");

        let selection = self.bookmarks.select_new_items(confirmed, listed);
        let Some(new_progress) = selection.new_progress else {
            info!("There are no new files to process");
            return Ok(LoadOutcome {
                previous_progress: confirmed,
                ..LoadOutcome::default()
            });
        };

        let mut dataset = Dataset::new();
        for item in &selection.items {
            let part = self.reader.read(item, self.config.format).await?;
            debug!(path = %item.path, rows = part.len(), "Read payload");
            dataset.append(part);
        }

        self.bookmarks
            .record_progress(new_progress, BookmarkStatus::InProgress)
            .await?;

        info!(
            files = selection.items.len(),
            rows = dataset.len(),
            new_progress,
            "Load cycle finished"
        );

        Ok(LoadOutcome {
            dataset,
            items: selection.items,
            new_progress: Some(new_progress),
            previous_progress: confirmed,
        })
    }

    /// Confirm the last load cycle. See [`Bookmarks::commit`].
    pub async fn commit(&self) -> Result<i64> {
        self.bookmarks.commit().await
    }

    pub async fn status(&self) -> Result<JobProgress> {
        self.bookmarks.status().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::SourceLocation;
    use crate::ledger::InMemoryLedger;
    use crate::source::InMemorySource;
    use bookmark_common::BookmarkError;

    fn loader(format: &str) -> (Arc<InMemoryLedger>, Arc<InMemorySource>, DataLoader) {
        let ledger = Arc::new(InMemoryLedger::new());
        let source = Arc::new(InMemorySource::new());
        let config =
            LoaderConfig::new(SourceLocation::new("bucket", "data/"), format, "job_123").unwrap();
        let loader = DataLoader::new(config, ledger.clone(), source.clone(), source.clone());
        (ledger, source, loader)
    }

    #[tokio::test]
    async fn test_new_performs_no_io() {
        let (ledger, _, _loader) = loader("csv");
        assert_eq!(ledger.create_calls(), 0);
        assert_eq!(ledger.put_calls(), 0);
    }

    #[tokio::test]
    async fn test_load_records_in_progress() {
        let (ledger, source, loader) = loader("csv");
        loader.initialize().await.unwrap();
        source.put("data/a.csv", 100, "id\n1\n2\n").await;
        source.put("data/b.csv", 200, "id\n3\n").await;

        let outcome = loader.load().await.unwrap();

        assert_eq!(outcome.new_progress, Some(200));
        assert_eq!(outcome.dataset.len(), 3);
        assert_eq!(
            outcome.summary(),
            LoadSummary {
                files: 2,
                rows: 3,
                columns: 1,
                previous_progress: 0,
                new_progress: Some(200),
            }
        );

        let records = ledger.records("bookmark_table", "job_123").await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, BookmarkStatus::InProgress);
        assert_eq!(records[0].bookmark_timestamp, 200);
    }

    #[tokio::test]
    async fn test_load_without_new_files_writes_nothing() {
        let (ledger, source, loader) = loader("json");
        loader.initialize().await.unwrap();
        source.put("data/a.csv", 100, "id\n1\n").await;

        let outcome = loader.load().await.unwrap();

        assert!(outcome.is_empty());
        assert!(outcome.dataset.is_empty());
        assert_eq!(outcome.new_progress, None);
        assert_eq!(ledger.put_calls(), 0);
        assert_eq!(source.reads(), 0);
    }

    #[tokio::test]
    async fn test_load_before_initialize_fails() {
        let (_, source, loader) = loader("csv");
        source.put("data/a.csv", 100, "id\n1\n").await;

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, BookmarkError::LedgerQueryFailed { .. }));
    }
}
