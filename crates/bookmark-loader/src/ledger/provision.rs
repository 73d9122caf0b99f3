//! Idempotent ledger table provisioning

use std::time::Duration;

use bookmark_common::{BookmarkError, Result};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

use super::{KeySchema, LedgerClient, TableDescription, TableState};

/// How long [`ensure_store`] waits for a new table by default.
pub const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed delay between readiness checks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Make sure `table` exists with `key_schema` and is ready for reads and writes.
///
/// An existing, active table is validated and returned immediately without
/// issuing a create request. Otherwise the table is created (on-demand
/// billing) and polled every [`POLL_INTERVAL`] until it is ready or
/// `timeout` elapses.
#[instrument(skip(client, key_schema), fields(timeout_secs = timeout.as_secs()))]
pub async fn ensure_store<C>(
    client: &C,
    table: &str,
    key_schema: &KeySchema,
    timeout: Duration,
) -> Result<()>
where
    C: LedgerClient + ?Sized,
{
    if let Some(existing) = client.describe_table(table).await? {
        validate_schema(&existing, key_schema)?;

        if existing.state.is_ready() {
            debug!(table, "Ledger table already exists");
            return Ok(());
        }

        if existing.state == TableState::Creating {
            info!(table, "Ledger table is still being created, waiting for it");
            return wait_until_ready(client, table, key_schema, timeout).await;
        }

        return Err(BookmarkError::ProvisioningFailed {
            table: table.to_string(),
            reason: format!("table is in state {:?}", existing.state),
        });
    }

    info!(table, "Creating ledger table");
    client.create_table(table, key_schema).await?;

    wait_until_ready(client, table, key_schema, timeout).await
}

/// Poll until `table` no longer exists or `timeout` elapses.
#[instrument(skip(client), fields(timeout_secs = timeout.as_secs()))]
pub async fn wait_for_deletion<C>(client: &C, table: &str, timeout: Duration) -> Result<()>
where
    C: LedgerClient + ?Sized,
{
    let started = Instant::now();

    loop {
        if client.describe_table(table).await?.is_none() {
            info!(table, "Ledger table deleted");
            return Ok(());
        }

        if started.elapsed() >= timeout {
            return Err(BookmarkError::ProvisioningTimeout {
                table: table.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }

        sleep(POLL_INTERVAL).await;
    }
}

/// Poll until `table` is ready, then check its key schema. A table created
/// concurrently by another caller may carry a different schema.
async fn wait_until_ready<C>(
    client: &C,
    table: &str,
    key_schema: &KeySchema,
    timeout: Duration,
) -> Result<()>
where
    C: LedgerClient + ?Sized,
{
    let started = Instant::now();
    let mut polls = 0u32;

    loop {
        match client.describe_table(table).await? {
            Some(description) if description.state.is_ready() => {
                validate_schema(&description, key_schema)?;
                info!(table, polls, "Ledger table is ready");
                return Ok(());
            },
            Some(description) if description.state == TableState::Creating => {
                debug!(table, "Ledger table not ready yet");
            },
            Some(description) => {
                return Err(BookmarkError::ProvisioningFailed {
                    table: table.to_string(),
                    reason: format!("table entered state {:?} while waiting", description.state),
                });
            },
            // A freshly created table can briefly be invisible to describe.
            None => debug!(table, "Ledger table not visible yet"),
        }

        if started.elapsed() >= timeout {
            warn!(table, polls, "Gave up waiting for ledger table");
            return Err(BookmarkError::ProvisioningTimeout {
                table: table.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }

        polls += 1;
        sleep(POLL_INTERVAL).await;
    }
}

fn validate_schema(description: &TableDescription, expected: &KeySchema) -> Result<()> {
    let checks = [
        ("partition", &description.partition_key, &expected.partition_key),
        ("sort", &description.sort_key, &expected.sort_key),
    ];

    for (key, actual, expected) in checks {
        if actual.as_deref() != Some(expected.as_str()) {
            return Err(BookmarkError::SchemaMismatch {
                table: description.name.clone(),
                key,
                expected: expected.clone(),
                actual: actual.clone().unwrap_or_else(|| "<none>".to_string()),
            });
        }
    }

    Ok(())
}
