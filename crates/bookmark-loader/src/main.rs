//! Bookmark Loader - incremental S3 loads with a DynamoDB bookmark ledger

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bookmark_common::logging::{init_logging, LogConfig, LogLevel};
use bookmark_loader::ledger::{wait_for_deletion, DEFAULT_PROVISION_TIMEOUT, DEFAULT_LEDGER_TABLE};
use bookmark_loader::{
    AwsConfig, DataLoader, DynamoLedger, LedgerClient, LoaderConfig, S3Source, SourceLocation,
};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bookmark-loader")]
#[command(author, version, about = "Incremental S3 loader with a DynamoDB bookmark ledger")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Source bucket
    #[arg(long, env = "SOURCE_BUCKET")]
    bucket: String,

    /// Key prefix under the bucket
    #[arg(long, env = "SOURCE_PREFIX", default_value = "")]
    prefix: String,

    /// Payload format: csv, parquet, json or xml
    #[arg(long, env = "DATA_FORMAT", default_value = "csv")]
    format: String,

    /// Job name the bookmarks are recorded under
    #[arg(long, env = "JOB_NAME")]
    job: String,

    /// Ledger table
    #[arg(long, env = "BOOKMARK_TABLE", default_value = DEFAULT_LEDGER_TABLE)]
    table: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the ledger table if it does not exist
    Provision,

    /// Run one load cycle
    Load {
        /// Commit the new bookmark right after loading
        #[arg(long)]
        commit: bool,

        /// Write the loaded rows to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Confirm the last load cycle
    Commit,

    /// Show the confirmed and pending bookmarks
    Status,

    /// Delete the ledger table
    Cleanup {
        /// Also delete every object under the prefix
        #[arg(long)]
        delete_objects: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("bookmark-loader")
        .build()
        .merge_env()?;

    let _guard = init_logging(&log_config)?;

    let config = LoaderConfig::new(
        SourceLocation::new(&cli.bucket, &cli.prefix),
        &cli.format,
        &cli.job,
    )?
    .with_ledger_table(&cli.table);

    let clients = AwsConfig::from_env().connect().await;
    let loader = DataLoader::from_clients(config.clone(), &clients);

    match cli.command {
        Command::Provision => {
            loader.initialize().await.with_context(|| {
                format!("Failed to provision ledger table {}", config.ledger_table)
            })?;
            info!(table = %config.ledger_table, "Ledger table is ready");
        },
        Command::Load { commit, output } => {
            loader.initialize().await?;
            let outcome = loader
                .load()
                .await
                .with_context(|| format!("Load cycle failed for {}", config.source.uri()))?;

            if let Some(path) = output {
                let file = File::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                outcome.dataset.write_csv(BufWriter::new(file))?;
                info!(path = %path.display(), rows = outcome.dataset.len(), "Wrote dataset");
            }

            println!("{}", serde_json::to_string_pretty(&outcome.summary())?);

            if commit && !outcome.is_empty() {
                let confirmed = loader.commit().await?;
                info!(confirmed, "Committed load cycle");
            }
        },
        Command::Commit => {
            let confirmed = loader.commit().await?;
            println!("{confirmed}");
        },
        Command::Status => {
            let progress = loader.status().await?;
            println!("{}", serde_json::to_string_pretty(&progress)?);
        },
        Command::Cleanup { delete_objects } => {
            let ledger = DynamoLedger::new(clients.dynamodb.clone());
            ledger.delete_table(&config.ledger_table).await?;
            wait_for_deletion(&ledger, &config.ledger_table, DEFAULT_PROVISION_TIMEOUT).await?;

            if delete_objects {
                let source = S3Source::new(clients.s3.clone(), &config.source.bucket);
                let deleted = source.delete_prefix(&config.source.prefix).await?;
                info!(deleted, "Deleted source objects");
            }
        },
    }

    Ok(())
}
