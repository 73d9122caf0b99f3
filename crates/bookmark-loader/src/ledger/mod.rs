//! Bookmark ledger storage
//!
//! The ledger is an append-only table of [`BookmarkRecord`]s keyed by
//! (job name, bookmark timestamp). [`LedgerClient`] is the seam between the
//! bookmark state machine and the backing store; [`DynamoLedger`] talks to
//! DynamoDB and [`InMemoryLedger`] keeps everything in process.

use async_trait::async_trait;
use bookmark_common::{BookmarkStatus, Result};
use serde::{Deserialize, Serialize};

pub mod dynamodb;
pub mod memory;
pub mod provision;

pub use dynamodb::DynamoLedger;
pub use memory::InMemoryLedger;
pub use provision::{ensure_store, wait_for_deletion, DEFAULT_PROVISION_TIMEOUT, POLL_INTERVAL};

/// Partition key attribute of the ledger table.
pub const JOB_NAME_ATTRIBUTE: &str = "job_name";

/// Sort key attribute of the ledger table.
pub const BOOKMARK_TIMESTAMP_ATTRIBUTE: &str = "bookmark_timestamp";

pub const RECORDED_AT_ATTRIBUTE: &str = "data_load_timestamp";

pub const STATUS_ATTRIBUTE: &str = "status";

/// Default ledger table name.
pub const DEFAULT_LEDGER_TABLE: &str = "bookmark_table";

/// One row of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub job_name: String,
    /// Watermark in seconds since the epoch
    pub bookmark_timestamp: i64,
    /// Wall-clock time the record was written, seconds since the epoch
    pub recorded_at: i64,
    pub status: BookmarkStatus,
}

impl BookmarkRecord {
    pub fn new(
        job_name: impl Into<String>,
        bookmark_timestamp: i64,
        status: BookmarkStatus,
    ) -> Self {
        Self {
            job_name: job_name.into(),
            bookmark_timestamp,
            recorded_at: chrono::Utc::now().timestamp(),
            status,
        }
    }
}

/// Two-part primary key of a ledger table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    pub partition_key: String,
    pub sort_key: String,
}

impl KeySchema {
    pub fn new(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }

    /// The (`job_name`, `bookmark_timestamp`) schema every bookmark table must use.
    pub fn bookmark() -> Self {
        Self::new(JOB_NAME_ATTRIBUTE, BOOKMARK_TIMESTAMP_ATTRIBUTE)
    }
}

impl Default for KeySchema {
    fn default() -> Self {
        Self::bookmark()
    }
}

/// Lifecycle state reported by the store for a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Creating,
    Active,
    Updating,
    Deleting,
    Other,
}

impl TableState {
    /// Whether reads and writes can be issued against the table.
    pub fn is_ready(&self) -> bool {
        matches!(self, TableState::Active | TableState::Updating)
    }
}

/// What the store reports about an existing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    pub name: String,
    pub state: TableState,
    pub partition_key: Option<String>,
    pub sort_key: Option<String>,
}

/// Point operations against the ledger store
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Describe a table, or `None` when it does not exist.
    async fn describe_table(&self, table: &str) -> Result<Option<TableDescription>>;

    /// Request creation of a table with the given key schema.
    ///
    /// Returns once the request is accepted; the table may still be creating.
    async fn create_table(&self, table: &str, schema: &KeySchema) -> Result<()>;

    /// Request deletion of a table. Deleting a missing table is not an error.
    async fn delete_table(&self, table: &str) -> Result<()>;

    /// Durably store a record, replacing any record with the same key.
    async fn put_record(&self, table: &str, record: &BookmarkRecord) -> Result<()>;

    /// The record for `job_name` with the given status and the largest
    /// bookmark timestamp.
    async fn latest_record(
        &self,
        table: &str,
        job_name: &str,
        status: BookmarkStatus,
    ) -> Result<Option<BookmarkRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmark_key_schema() {
        let schema = KeySchema::default();
        assert_eq!(schema.partition_key, "job_name");
        assert_eq!(schema.sort_key, "bookmark_timestamp");
    }

    #[test]
    fn test_record_stamps_recorded_at() {
        let before = chrono::Utc::now().timestamp();
        let record = BookmarkRecord::new("job_123", 1_700_000_000, BookmarkStatus::InProgress);

        assert_eq!(record.job_name, "job_123");
        assert!(record.recorded_at >= before);
    }

    #[test]
    fn test_table_state_readiness() {
        assert!(TableState::Active.is_ready());
        assert!(TableState::Updating.is_ready());
        assert!(!TableState::Creating.is_ready());
        assert!(!TableState::Deleting.is_ready());
    }
}
