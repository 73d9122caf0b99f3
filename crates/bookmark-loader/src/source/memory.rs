//! In-process object store for tests and dry runs

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bookmark_common::{BookmarkError, DataFormat, Result};
use bytes::Bytes;
use tokio::sync::RwLock;

use super::{PayloadReader, SourceItem, SourceLister};
use crate::dataset::Dataset;
use crate::payload;

#[derive(Debug, Default)]
pub struct InMemorySource {
    objects: RwLock<BTreeMap<String, (i64, Bytes)>>,
    reads: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object, replacing any existing object with the same path.
    pub async fn put(&self, path: impl Into<String>, last_modified: i64, data: impl Into<Bytes>) {
        self.objects
            .write()
            .await
            .insert(path.into(), (last_modified, data.into()));
    }

    /// Number of payloads read so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceLister for InMemorySource {
    async fn list(&self, prefix: &str) -> Result<Vec<SourceItem>> {
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .filter(|(path, _)| path.starts_with(prefix))
            .map(|(path, (modified, _))| SourceItem::new(path.clone(), *modified))
            .collect())
    }
}

#[async_trait]
impl PayloadReader for InMemorySource {
    async fn read(&self, item: &SourceItem, format: DataFormat) -> Result<Dataset> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let data = self
            .objects
            .read()
            .await
            .get(&item.path)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| BookmarkError::payload(&item.path, "object does not exist"))?;

        payload::decode(&item.path, format, data)
    }
}
