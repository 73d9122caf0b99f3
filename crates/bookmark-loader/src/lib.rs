//! Bookmark Loader Library
//!
//! Incremental loading of objects from an S3 prefix, with progress tracked as
//! bookmarks in a DynamoDB ledger table.
//!
//! # Overview
//!
//! - **Ledger**: bookmark records, table provisioning and the [`LedgerClient`]
//!   seam, with DynamoDB and in-memory implementations
//! - **Source**: object listing and payload reads from S3 or memory
//! - **Payload**: CSV, JSON and Parquet decoding into a [`Dataset`]
//! - **Bookmarks**: the two-phase `IN_PROGRESS` / `COMPLETE` protocol
//! - **Loader**: one load cycle end to end
//!
//! # Example
//!
//! ```no_run
//! use bookmark_loader::{AwsConfig, DataLoader, LoaderConfig, SourceLocation};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let clients = AwsConfig::from_env().connect().await;
//!     let source = SourceLocation::new("my-bucket", "data/");
//!     let config = LoaderConfig::new(source, "csv", "job_123")?;
//!
//!     let loader = DataLoader::from_clients(config, &clients);
//!     loader.initialize().await?;
//!
//!     let outcome = loader.load().await?;
//!     println!("loaded {} rows", outcome.dataset.len());
//!
//!     // Confirm only once the rows are safely stored downstream
//!     loader.commit().await?;
//!     Ok(())
//! }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod aws;
pub mod bookmark;
pub mod config;
pub mod dataset;
pub mod ledger;
pub mod loader;
pub mod payload;
pub mod source;

pub use aws::{AwsClients, AwsConfig};
pub use bookmark::{select_new_items, Bookmarks, JobProgress, Selection};
pub use config::{LoaderConfig, SourceLocation};
pub use dataset::{Dataset, Row};
pub use ledger::{BookmarkRecord, DynamoLedger, InMemoryLedger, KeySchema, LedgerClient};
pub use loader::{DataLoader, LoadOutcome, LoadSummary};
pub use source::{InMemorySource, PayloadReader, S3Source, SourceItem, SourceLister};

