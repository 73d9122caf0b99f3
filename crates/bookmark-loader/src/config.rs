//! Job configuration
//!
//! Building a [`LoaderConfig`] validates the data format and performs no I/O.
//! Ledger provisioning only happens through an explicit
//! [`crate::DataLoader::initialize`] call.

use bookmark_common::{DataFormat, Result};
use serde::{Deserialize, Serialize};

use crate::ledger::DEFAULT_LEDGER_TABLE;

/// Where a job's source objects live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub bucket: String,
    pub prefix: String,
}

impl SourceLocation {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.prefix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub source: SourceLocation,
    pub format: DataFormat,
    /// Stable name of the recurring job; partition key in the ledger
    pub job_name: String,
    pub ledger_table: String,
}

impl LoaderConfig {
    /// Fails with `InvalidFormat` if `format` is not one of csv, parquet,
    /// json or xml.
    pub fn new(
        source: SourceLocation,
        format: &str,
        job_name: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            source,
            format: format.parse()?,
            job_name: job_name.into(),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
        })
    }

    pub fn with_ledger_table(mut self, table: impl Into<String>) -> Self {
        self.ledger_table = table.into();
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bookmark_common::BookmarkError;

    #[test]
    fn test_defaults_to_bookmark_table() {
        let config =
            LoaderConfig::new(SourceLocation::new("bucket", "data"), "csv", "job_123").unwrap();

        assert_eq!(config.ledger_table, "bookmark_table");
        assert_eq!(config.format, DataFormat::Csv);
        assert_eq!(config.source.uri(), "s3://bucket/data");
    }

    #[test]
    fn test_rejects_unknown_format() {
        let err = LoaderConfig::new(SourceLocation::new("bucket", "data"), "avro", "job_123")
            .unwrap_err();

        assert!(matches!(err, BookmarkError::InvalidFormat(ref f) if f == "avro"));
    }

    #[test]
    fn test_with_ledger_table() {
        let config = LoaderConfig::new(SourceLocation::new("bucket", "data"), "json", "job")
            .unwrap()
            .with_ledger_table("custom_bookmarks");

        assert_eq!(config.ledger_table, "custom_bookmarks");
    }
}
