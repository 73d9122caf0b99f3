//! Shared helpers for loader integration tests

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use bookmark_loader::{DataLoader, InMemoryLedger, InMemorySource, LoaderConfig, SourceLocation};
use bytes::Bytes;
use parquet::data_type::Int64Type;
use parquet::file::properties::WriterProperties;
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::parser::parse_message_type;

pub const BUCKET: &str = "bucket";
pub const PREFIX: &str = "data/";
pub const JOB: &str = "job_123";
pub const TABLE: &str = "bookmark_table";

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bookmark_loader=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// A loader over in-memory collaborators
pub struct Harness {
    pub ledger: Arc<InMemoryLedger>,
    pub source: Arc<InMemorySource>,
    pub loader: DataLoader,
}

impl Harness {
    pub fn new(format: &str) -> Self {
        Self::with_ledger(format, InMemoryLedger::new())
    }

    pub fn with_ledger(format: &str, ledger: InMemoryLedger) -> Self {
        init_tracing();

        let ledger = Arc::new(ledger);
        let source = Arc::new(InMemorySource::new());
        let config = LoaderConfig::new(SourceLocation::new(BUCKET, PREFIX), format, JOB).unwrap();
        let loader = DataLoader::new(config, ledger.clone(), source.clone(), source.clone());

        Self {
            ledger,
            source,
            loader,
        }
    }

    /// Harness whose ledger table already exists.
    pub async fn initialized(format: &str) -> Self {
        let harness = Self::new(format);
        harness.loader.initialize().await.unwrap();
        harness
    }

    pub async fn put(&self, name: &str, last_modified: i64, data: impl Into<Bytes>) {
        self.source
            .put(format!("{PREFIX}{name}"), last_modified, data)
            .await;
    }
}

/// A single-column (`id`) Parquet file.
pub fn parquet_bytes(ids: &[i64]) -> Bytes {
    let schema = Arc::new(parse_message_type("message schema { REQUIRED INT64 id; }").unwrap());
    let props = Arc::new(WriterProperties::builder().build());

    let mut buffer = Vec::new();
    let mut writer = SerializedFileWriter::new(&mut buffer, schema, props).unwrap();
    let mut row_group = writer.next_row_group().unwrap();
    while let Some(mut column) = row_group.next_column().unwrap() {
        column
            .typed::<Int64Type>()
            .write_batch(ids, None, None)
            .unwrap();
        column.close().unwrap();
    }
    row_group.close().unwrap();
    writer.close().unwrap();

    Bytes::from(buffer)
}
