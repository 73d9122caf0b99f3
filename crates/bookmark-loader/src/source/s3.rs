use async_trait::async_trait;
use aws_sdk_s3::{error::DisplayErrorContext, Client};
use bookmark_common::{BookmarkError, DataFormat, Result};
use tracing::{debug, info, instrument};

use super::{PayloadReader, SourceItem, SourceLister};
use crate::dataset::Dataset;
use crate::payload;

/// Objects in one S3 bucket
#[derive(Clone)]
pub struct S3Source {
    client: Client,
    bucket: String,
}

impl S3Source {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn uri(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }

    /// Delete every object under `prefix`, returning how many were removed.
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let items = self.list(prefix).await?;

        for item in &items {
            debug!("Deleting {}", self.uri(&item.path));
            self.client
                .delete_object()
                .bucket(&self.bucket)
                .key(&item.path)
                .send()
                .await
                .map_err(|err| BookmarkError::SourceDeleteFailed {
                    location: self.uri(&item.path),
                    reason: DisplayErrorContext(&err).to_string(),
                })?;
        }

        info!(deleted = items.len(), "Deleted source objects");
        Ok(items.len())
    }
}

#[async_trait]
impl SourceLister for S3Source {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list(&self, prefix: &str) -> Result<Vec<SourceItem>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut items = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|err| BookmarkError::SourceListFailed {
                location: self.uri(prefix),
                reason: DisplayErrorContext(&err).to_string(),
            })?;

            for object in page.contents() {
                let (Some(key), Some(modified)) = (object.key(), object.last_modified()) else {
                    continue;
                };
                items.push(SourceItem::new(key, modified.secs()));
            }
        }

        debug!(count = items.len(), "Listed source objects");
        Ok(items)
    }
}

#[async_trait]
impl PayloadReader for S3Source {
    #[instrument(skip(self, item), fields(path = %item.path))]
    async fn read(&self, item: &SourceItem, format: DataFormat) -> Result<Dataset> {
        let uri = self.uri(&item.path);
        info!("Loading {}", uri);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&item.path)
            .send()
            .await
            .map_err(|err| BookmarkError::payload(&uri, DisplayErrorContext(&err)))?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|err| BookmarkError::payload(&uri, err))?
            .into_bytes();

        debug!(bytes = data.len(), "Downloaded payload");
        payload::decode(&uri, format, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri() {
        let source = S3Source::new(
            Client::from_conf(aws_sdk_s3::Config::builder().build()),
            "123456789012-bookmark-utils-test",
        );

        assert_eq!(
            source.uri("data/a.csv"),
            "s3://123456789012-bookmark-utils-test/data/a.csv"
        );
        assert_eq!(source.bucket(), "123456789012-bookmark-utils-test");
    }
}
