//! Source objects and the collaborators that list and read them

use async_trait::async_trait;
use bookmark_common::{DataFormat, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

pub mod memory;
pub mod s3;

pub use memory::InMemorySource;
pub use s3::S3Source;

/// An object under the job's source prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceItem {
    /// Object key, relative to the bucket
    pub path: String,
    /// Last-modified time in seconds since the epoch
    pub last_modified: i64,
}

impl SourceItem {
    pub fn new(path: impl Into<String>, last_modified: i64) -> Self {
        Self {
            path: path.into(),
            last_modified,
        }
    }
}

/// Lists objects under a prefix. Ordering of the result is not guaranteed.
#[async_trait]
pub trait SourceLister: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<Vec<SourceItem>>;
}

/// Fetches one object and decodes it into a dataset.
#[async_trait]
pub trait PayloadReader: Send + Sync {
    async fn read(&self, item: &SourceItem, format: DataFormat) -> Result<Dataset>;
}
