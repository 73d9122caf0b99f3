//! Two-phase bookmark protocol
//!
//! A load cycle records the newest selected object's timestamp as an
//! `IN_PROGRESS` bookmark; the caller later confirms it with [`Bookmarks::commit`],
//! which records the same timestamp as `COMPLETE`. Only `COMPLETE` bookmarks
//! move the point new objects are selected from, so a cycle that is never
//! committed is selected again by the next run.

use std::sync::Arc;

use bookmark_common::{BookmarkError, BookmarkStatus, DataFormat, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::LoaderConfig;
use crate::ledger::{BookmarkRecord, LedgerClient};
use crate::source::SourceItem;

/// Objects picked by one load cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Last-modified time of the newest selected object
    pub new_progress: Option<i64>,
    /// Selected objects, newest first
    pub items: Vec<SourceItem>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Keep items modified strictly after `confirmed` whose path carries the
/// format's extension, newest first.
///
/// Returns an empty selection with no watermark when nothing qualifies.
pub fn select_new_items<I>(format: DataFormat, confirmed: i64, items: I) -> Selection
where
    I: IntoIterator<Item = SourceItem>,
{
    let mut selected: Vec<SourceItem> = items
        .into_iter()
        .filter(|item| item.last_modified > confirmed && format.matches_path(&item.path))
        .collect();

    selected.sort_by(|a, b| {
        b.last_modified
            .cmp(&a.last_modified)
            .then_with(|| a.path.cmp(&b.path))
    });

    Selection {
        new_progress: selected.first().map(|item| item.last_modified),
        items: selected,
    }
}

/// Both watermarks of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub job_name: String,
    /// Newest confirmed watermark, 0 when the job never completed a cycle
    pub confirmed: i64,
    /// Tentative watermark waiting for a commit, if any
    pub pending: Option<i64>,
}

/// Bookmark state machine for one job
#[derive(Clone)]
pub struct Bookmarks {
    ledger: Arc<dyn LedgerClient>,
    table: String,
    job_name: String,
    format: DataFormat,
}

impl Bookmarks {
    pub fn new(ledger: Arc<dyn LedgerClient>, config: &LoaderConfig) -> Self {
        Self {
            ledger,
            table: config.ledger_table.clone(),
            job_name: config.job_name.clone(),
            format: config.format,
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Newest `COMPLETE` watermark, or 0 ("beginning of time") if none exists.
    #[instrument(skip(self), fields(job = %self.job_name))]
    pub async fn query_confirmed_progress(&self) -> Result<i64> {
        let confirmed = self
            .latest(BookmarkStatus::Complete)
            .await?
            .unwrap_or(0);

        debug!(confirmed, "Queried confirmed progress");
        Ok(confirmed)
    }

    /// Newest `IN_PROGRESS` watermark, if any.
    #[instrument(skip(self), fields(job = %self.job_name))]
    pub async fn query_in_progress(&self) -> Result<Option<i64>> {
        self.latest(BookmarkStatus::InProgress).await
    }

    pub fn select_new_items<I>(&self, confirmed: i64, items: I) -> Selection
    where
        I: IntoIterator<Item = SourceItem>,
    {
        select_new_items(self.format, confirmed, items)
    }

    /// Append a bookmark. Returns once the write is durable.
    #[instrument(skip(self), fields(job = %self.job_name))]
    pub async fn record_progress(&self, timestamp: i64, status: BookmarkStatus) -> Result<()> {
        let record = BookmarkRecord::new(self.job_name.clone(), timestamp, status);
        self.ledger.put_record(&self.table, &record).await?;

        info!(watermark = timestamp, %status, "Recorded bookmark");
        Ok(())
    }

    /// Confirm the newest tentative watermark and return it.
    ///
    /// Fails with `NoPendingProgress` (without writing) when there is no
    /// `IN_PROGRESS` bookmark newer than the confirmed one. Older tentative
    /// bookmarks are superseded by the confirmed watermark.
    #[instrument(skip(self), fields(job = %self.job_name))]
    pub async fn commit(&self) -> Result<i64> {
        let progress = self.status().await?;

        let Some(pending) = progress.pending else {
            return Err(BookmarkError::NoPendingProgress(self.job_name.clone()));
        };

        self.record_progress(pending, BookmarkStatus::Complete).await?;
        info!(
            previous = progress.confirmed,
            confirmed = pending,
            "Committed bookmark"
        );
        Ok(pending)
    }

    /// Confirmed watermark plus the tentative one still awaiting commit.
    pub async fn status(&self) -> Result<JobProgress> {
        let confirmed = self.query_confirmed_progress().await?;
        let pending = self
            .query_in_progress()
            .await?
            .filter(|pending| *pending > confirmed);

        Ok(JobProgress {
            job_name: self.job_name.clone(),
            confirmed,
            pending,
        })
    }

    async fn latest(&self, status: BookmarkStatus) -> Result<Option<i64>> {
        Ok(self
            .ledger
            .latest_record(&self.table, &self.job_name, status)
            .await?
            .map(|record| record.bookmark_timestamp))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::SourceLocation;
    use crate::ledger::{InMemoryLedger, KeySchema};

    fn items(entries: &[(&str, i64)]) -> Vec<SourceItem> {
        entries
            .iter()
            .map(|(path, ts)| SourceItem::new(*path, *ts))
            .collect()
    }

    async fn bookmarks() -> (Arc<InMemoryLedger>, Bookmarks) {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger
            .create_table("bookmark_table", &KeySchema::bookmark())
            .await
            .unwrap();
        let config =
            LoaderConfig::new(SourceLocation::new("bucket", "data"), "csv", "job_123").unwrap();
        let bookmarks = Bookmarks::new(ledger.clone(), &config);
        (ledger, bookmarks)
    }

    #[test]
    fn test_selects_newer_matching_items_newest_first() {
        let selection = select_new_items(
            DataFormat::Csv,
            100,
            items(&[
                ("data/old.csv", 90),
                ("data/boundary.csv", 100),
                ("data/b.csv", 150),
                ("data/a.csv", 120),
                ("data/notes.txt", 200),
            ]),
        );

        assert_eq!(selection.new_progress, Some(150));
        assert_eq!(
            selection.items,
            items(&[("data/b.csv", 150), ("data/a.csv", 120)])
        );
    }

    #[test]
    fn test_nothing_new_is_an_empty_selection() {
        let selection = select_new_items(DataFormat::Json, 500, items(&[("data/a.json", 500)]));

        assert!(selection.is_empty());
        assert_eq!(selection.new_progress, None);
    }

    #[test]
    fn test_equal_timestamps_are_ordered_by_path() {
        let selection = select_new_items(
            DataFormat::Parquet,
            0,
            items(&[("data/b.parquet", 10), ("data/a.parquet", 10)]),
        );

        assert_eq!(selection.items[0].path, "data/a.parquet");
        assert_eq!(selection.new_progress, Some(10));
    }

    #[tokio::test]
    async fn test_confirmed_progress_defaults_to_zero() {
        let (_, bookmarks) = bookmarks().await;
        assert_eq!(bookmarks.query_confirmed_progress().await.unwrap(), 0);
        assert_eq!(bookmarks.query_in_progress().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_commit_promotes_largest_in_progress() {
        let (_, bookmarks) = bookmarks().await;
        bookmarks
            .record_progress(100, BookmarkStatus::InProgress)
            .await
            .unwrap();
        bookmarks
            .record_progress(300, BookmarkStatus::InProgress)
            .await
            .unwrap();
        bookmarks
            .record_progress(200, BookmarkStatus::InProgress)
            .await
            .unwrap();

        assert_eq!(bookmarks.commit().await.unwrap(), 300);
        assert_eq!(bookmarks.query_confirmed_progress().await.unwrap(), 300);
    }

    #[tokio::test]
    async fn test_commit_without_pending_progress_fails_without_writing() {
        let (ledger, bookmarks) = bookmarks().await;

        let err = bookmarks.commit().await.unwrap_err();

        assert!(matches!(err, BookmarkError::NoPendingProgress(ref job) if job == "job_123"));
        assert_eq!(ledger.put_calls(), 0);
    }

    #[tokio::test]
    async fn test_superseded_in_progress_is_not_pending() {
        let (_, bookmarks) = bookmarks().await;
        bookmarks
            .record_progress(100, BookmarkStatus::InProgress)
            .await
            .unwrap();
        bookmarks
            .record_progress(200, BookmarkStatus::Complete)
            .await
            .unwrap();

        let progress = bookmarks.status().await.unwrap();
        assert_eq!(progress.confirmed, 200);
        assert_eq!(progress.pending, None);
        assert!(matches!(
            bookmarks.commit().await,
            Err(BookmarkError::NoPendingProgress(_))
        ));
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let (ledger, bookmarks) = bookmarks().await;
        ledger.set_fail_writes(true);

        let err = bookmarks
            .record_progress(100, BookmarkStatus::InProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, BookmarkError::LedgerWriteFailed { .. }));
    }
}
