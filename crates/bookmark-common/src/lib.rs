//! Bookmark Common Library
//!
//! Shared types, error handling and logging for the bookmark loader workspace.
//!
//! # Overview
//!
//! - **Error Handling**: the [`BookmarkError`] taxonomy and [`Result`] alias
//! - **Types**: data formats and bookmark statuses shared by every crate
//! - **Logging**: `tracing` subscriber setup driven by [`logging::LogConfig`]
//!
//! # Example
//!
//! ```no_run
//! use bookmark_common::{BookmarkError, DataFormat, Result};
//!
//! fn parse(format: &str) -> Result<DataFormat> {
//!     format.parse::<DataFormat>()
//! }
//!
//! assert!(matches!(parse("avro"), Err(BookmarkError::InvalidFormat(_))));
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{BookmarkError, Result};
pub use types::{BookmarkStatus, DataFormat};
