//! Common types used across the bookmark loader

use crate::error::BookmarkError;
use serde::{Deserialize, Serialize};

/// Payload format of the objects a job loads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    Parquet,
    Json,
    /// Accepted in configuration, but no payload reader exists for it.
    Xml,
}

impl DataFormat {
    pub const ALL: [DataFormat; 4] = [
        DataFormat::Csv,
        DataFormat::Parquet,
        DataFormat::Json,
        DataFormat::Xml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Parquet => "parquet",
            DataFormat::Json => "json",
            DataFormat::Xml => "xml",
        }
    }

    /// Whether an object key carries this format's file extension.
    pub fn matches_path(&self, path: &str) -> bool {
        path.strip_suffix(self.as_str())
            .is_some_and(|stem| stem.ends_with('.'))
    }
}

impl std::str::FromStr for DataFormat {
    type Err = BookmarkError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "csv" => Ok(DataFormat::Csv),
            "parquet" => Ok(DataFormat::Parquet),
            "json" => Ok(DataFormat::Json),
            "xml" => Ok(DataFormat::Xml),
            other => Err(BookmarkError::InvalidFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of a bookmark record in the ledger
///
/// `InProgress` is a tentative watermark written by a load cycle;
/// `Complete` is a watermark the caller confirmed as fully processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookmarkStatus {
    InProgress,
    Complete,
}

impl BookmarkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkStatus::InProgress => "IN_PROGRESS",
            BookmarkStatus::Complete => "COMPLETE",
        }
    }
}

impl std::str::FromStr for BookmarkStatus {
    type Err = BookmarkError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(BookmarkStatus::InProgress),
            "COMPLETE" => Ok(BookmarkStatus::Complete),
            other => Err(BookmarkError::Config(format!(
                "unknown bookmark status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for BookmarkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
