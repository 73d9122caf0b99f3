//! In-process ledger
//!
//! Mirrors DynamoDB semantics closely enough to exercise the bookmark
//! protocol without AWS: records are keyed by (job, timestamp) and a put
//! replaces an existing record with the same key. Tables can be configured to
//! report `Creating` for a number of describe calls, and create requests or
//! writes can be made to fail.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bookmark_common::{BookmarkError, BookmarkStatus, Result};
use tokio::sync::RwLock;

use super::{BookmarkRecord, KeySchema, LedgerClient, TableDescription, TableState};

#[derive(Debug)]
struct MemoryTable {
    schema: KeySchema,
    pending_polls: u32,
    records: BTreeMap<(String, i64), BookmarkRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryLedger {
    tables: RwLock<HashMap<String, MemoryTable>>,
    creation_polls: u32,
    reject_creates: bool,
    fail_writes: AtomicBool,
    create_calls: AtomicUsize,
    put_calls: AtomicUsize,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// New tables report `Creating` for this many describe calls before
    /// turning `Active`.
    pub fn with_creation_polls(mut self, polls: u32) -> Self {
        self.creation_polls = polls;
        self
    }

    /// Every create request is rejected.
    pub fn rejecting_creates(mut self) -> Self {
        self.reject_creates = true;
        self
    }

    /// Make subsequent puts fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of successful record writes.
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// All records for a job, newest bookmark first.
    pub async fn records(&self, table: &str, job_name: &str) -> Vec<BookmarkRecord> {
        let tables = self.tables.read().await;
        tables
            .get(table)
            .map(|t| {
                t.records
                    .values()
                    .rev()
                    .filter(|r| r.job_name == job_name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn describe_table(&self, table: &str) -> Result<Option<TableDescription>> {
        let mut tables = self.tables.write().await;
        let Some(entry) = tables.get_mut(table) else {
            return Ok(None);
        };

        let state = if entry.pending_polls > 0 {
            entry.pending_polls -= 1;
            TableState::Creating
        } else {
            TableState::Active
        };

        Ok(Some(TableDescription {
            name: table.to_string(),
            state,
            partition_key: Some(entry.schema.partition_key.clone()),
            sort_key: Some(entry.schema.sort_key.clone()),
        }))
    }

    async fn create_table(&self, table: &str, schema: &KeySchema) -> Result<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if self.reject_creates {
            return Err(BookmarkError::ProvisioningFailed {
                table: table.to_string(),
                reason: "create request rejected".to_string(),
            });
        }

        let mut tables = self.tables.write().await;
        if tables.contains_key(table) {
            return Err(BookmarkError::ProvisioningFailed {
                table: table.to_string(),
                reason: "table already exists".to_string(),
            });
        }

        tables.insert(
            table.to_string(),
            MemoryTable {
                schema: schema.clone(),
                pending_polls: self.creation_polls,
                records: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<()> {
        self.tables.write().await.remove(table);
        Ok(())
    }

    async fn put_record(&self, table: &str, record: &BookmarkRecord) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(BookmarkError::ledger_write(table, "injected write failure"));
        }

        let mut tables = self.tables.write().await;
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| BookmarkError::ledger_write(table, "table does not exist"))?;

        entry.records.insert(
            (record.job_name.clone(), record.bookmark_timestamp),
            record.clone(),
        );
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn latest_record(
        &self,
        table: &str,
        job_name: &str,
        status: BookmarkStatus,
    ) -> Result<Option<BookmarkRecord>> {
        let tables = self.tables.read().await;
        let entry = tables
            .get(table)
            .ok_or_else(|| BookmarkError::ledger_query(table, "table does not exist"))?;

        let latest = entry
            .records
            .range((job_name.to_string(), i64::MIN)..=(job_name.to_string(), i64::MAX))
            .rev()
            .map(|(_, record)| record)
            .find(|record| record.status == status)
            .cloned();

        Ok(latest)
    }
}
