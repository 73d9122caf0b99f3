//! DynamoDB-backed ledger

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::DisplayErrorContext,
    types::{
        AttributeDefinition, AttributeValue, BillingMode, KeySchemaElement, KeyType,
        ScalarAttributeType, TableDescription as DynamoTableDescription, TableStatus,
    },
    Client,
};
use bookmark_common::{BookmarkError, BookmarkStatus, Result};
use tracing::{debug, instrument};

use super::{
    BookmarkRecord, KeySchema, LedgerClient, TableDescription, TableState,
    BOOKMARK_TIMESTAMP_ATTRIBUTE, JOB_NAME_ATTRIBUTE, RECORDED_AT_ATTRIBUTE, STATUS_ATTRIBUTE,
};

type Item = HashMap<String, AttributeValue>;

#[derive(Clone)]
pub struct DynamoLedger {
    client: Client,
}

impl DynamoLedger {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LedgerClient for DynamoLedger {
    #[instrument(skip(self))]
    async fn describe_table(&self, table: &str) -> Result<Option<TableDescription>> {
        match self.client.describe_table().table_name(table).send().await {
            Ok(output) => Ok(output.table().map(|t| to_description(table, t))),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                debug!(table, "Ledger table does not exist");
                Ok(None)
            },
            Err(err) => Err(BookmarkError::ledger_query(table, DisplayErrorContext(&err))),
        }
    }

    #[instrument(skip(self))]
    async fn create_table(&self, table: &str, schema: &KeySchema) -> Result<()> {
        let failed = |reason: String| BookmarkError::ProvisioningFailed {
            table: table.to_string(),
            reason,
        };

        let partition = key_element(&schema.partition_key, KeyType::Hash).map_err(&failed)?;
        let sort = key_element(&schema.sort_key, KeyType::Range).map_err(&failed)?;
        let partition_attr =
            attribute(&schema.partition_key, ScalarAttributeType::S).map_err(&failed)?;
        let sort_attr = attribute(&schema.sort_key, ScalarAttributeType::N).map_err(&failed)?;

        let result = self
            .client
            .create_table()
            .table_name(table)
            .key_schema(partition)
            .key_schema(sort)
            .attribute_definitions(partition_attr)
            .attribute_definitions(sort_attr)
            .billing_mode(BillingMode::PayPerRequest)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            // Someone else is creating the same table; readiness polling takes over.
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_in_use_exception()) =>
            {
                debug!(table, "Ledger table creation already in progress");
                Ok(())
            },
            Err(err) => Err(failed(DisplayErrorContext(&err).to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn delete_table(&self, table: &str) -> Result<()> {
        match self.client.delete_table().table_name(table).send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                Ok(())
            },
            Err(err) => Err(BookmarkError::ProvisioningFailed {
                table: table.to_string(),
                reason: DisplayErrorContext(&err).to_string(),
            }),
        }
    }

    #[instrument(
        skip(self, record),
        fields(
            job = %record.job_name,
            watermark = record.bookmark_timestamp,
            status = %record.status
        )
    )]
    async fn put_record(&self, table: &str, record: &BookmarkRecord) -> Result<()> {
        self.client
            .put_item()
            .table_name(table)
            .item(JOB_NAME_ATTRIBUTE, AttributeValue::S(record.job_name.clone()))
            .item(
                BOOKMARK_TIMESTAMP_ATTRIBUTE,
                AttributeValue::N(record.bookmark_timestamp.to_string()),
            )
            .item(
                RECORDED_AT_ATTRIBUTE,
                AttributeValue::N(record.recorded_at.to_string()),
            )
            .item(
                STATUS_ATTRIBUTE,
                AttributeValue::S(record.status.as_str().to_string()),
            )
            .send()
            .await
            .map_err(|err| BookmarkError::ledger_write(table, DisplayErrorContext(&err)))?;

        Ok(())
    }

    /// DynamoDB applies `Limit` before `FilterExpression`, so a `Limit=1`
    /// query can come back empty while a matching record exists further down
    /// the partition. Pages are walked newest-first until the first match.
    #[instrument(skip(self))]
    async fn latest_record(
        &self,
        table: &str,
        job_name: &str,
        status: BookmarkStatus,
    ) -> Result<Option<BookmarkRecord>> {
        let mut start_key: Option<Item> = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(table)
                .key_condition_expression("#job_name = :job_name")
                .filter_expression("#status = :status")
                .expression_attribute_names("#job_name", JOB_NAME_ATTRIBUTE)
                .expression_attribute_names("#status", STATUS_ATTRIBUTE)
                .expression_attribute_values(":job_name", AttributeValue::S(job_name.to_string()))
                .expression_attribute_values(
                    ":status",
                    AttributeValue::S(status.as_str().to_string()),
                )
                .scan_index_forward(false)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|err| BookmarkError::ledger_query(table, DisplayErrorContext(&err)))?;

            if let Some(item) = output.items().first() {
                return parse_record(table, item).map(Some);
            }

            match output.last_evaluated_key() {
                Some(key) => start_key = Some(key.clone()),
                None => return Ok(None),
            }
        }
    }
}

fn to_description(name: &str, table: &DynamoTableDescription) -> TableDescription {
    let state = match table.table_status() {
        Some(TableStatus::Active) => TableState::Active,
        Some(TableStatus::Creating) => TableState::Creating,
        Some(TableStatus::Updating) => TableState::Updating,
        Some(TableStatus::Deleting) => TableState::Deleting,
        _ => TableState::Other,
    };

    let key_named = |kind: KeyType| {
        table
            .key_schema()
            .iter()
            .find(|element| element.key_type() == &kind)
            .map(|element| element.attribute_name().to_string())
    };

    TableDescription {
        name: name.to_string(),
        state,
        partition_key: key_named(KeyType::Hash),
        sort_key: key_named(KeyType::Range),
    }
}

fn key_element(name: &str, key_type: KeyType) -> std::result::Result<KeySchemaElement, String> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(key_type)
        .build()
        .map_err(|e| e.to_string())
}

fn attribute(
    name: &str,
    attribute_type: ScalarAttributeType,
) -> std::result::Result<AttributeDefinition, String> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(attribute_type)
        .build()
        .map_err(|e| e.to_string())
}

fn parse_record(table: &str, item: &Item) -> Result<BookmarkRecord> {
    let job_name = string_attr(table, item, JOB_NAME_ATTRIBUTE)?.to_string();
    let bookmark_timestamp = number_attr(table, item, BOOKMARK_TIMESTAMP_ATTRIBUTE)?;
    let status = string_attr(table, item, STATUS_ATTRIBUTE)?
        .parse::<BookmarkStatus>()
        .map_err(|e| BookmarkError::ledger_query(table, e))?;
    // Observational only; older writers may not have set it.
    let recorded_at = number_attr(table, item, RECORDED_AT_ATTRIBUTE).unwrap_or(0);

    Ok(BookmarkRecord {
        job_name,
        bookmark_timestamp,
        recorded_at,
        status,
    })
}

fn string_attr<'a>(table: &str, item: &'a Item, name: &str) -> Result<&'a str> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| {
            BookmarkError::ledger_query(table, format!("missing string attribute '{}'", name))
        })
}

fn number_attr(table: &str, item: &Item, name: &str) -> Result<i64> {
    let raw = item
        .get(name)
        .and_then(|value| value.as_n().ok())
        .ok_or_else(|| {
            BookmarkError::ledger_query(table, format!("missing number attribute '{}'", name))
        })?;

    raw.parse::<i64>().map_err(|e| {
        BookmarkError::ledger_query(table, format!("attribute '{}' is not an integer: {}", name, e))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn item(pairs: &[(&str, AttributeValue)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_parse_record() {
        let record = parse_record(
            "bookmarks",
            &item(&[
                ("job_name", AttributeValue::S("job_123".into())),
                ("bookmark_timestamp", AttributeValue::N("1700000000".into())),
                ("data_load_timestamp", AttributeValue::N("1700000100".into())),
                ("status", AttributeValue::S("COMPLETE".into())),
            ]),
        )
        .unwrap();

        assert_eq!(
            record,
            BookmarkRecord {
                job_name: "job_123".to_string(),
                bookmark_timestamp: 1_700_000_000,
                recorded_at: 1_700_000_100,
                status: BookmarkStatus::Complete,
            }
        );
    }

    #[test]
    fn test_parse_record_rejects_bad_watermark() {
        let err = parse_record(
            "bookmarks",
            &item(&[
                ("job_name", AttributeValue::S("job_123".into())),
                ("bookmark_timestamp", AttributeValue::S("yesterday".into())),
                ("status", AttributeValue::S("COMPLETE".into())),
            ]),
        )
        .unwrap_err();

        assert!(matches!(err, BookmarkError::LedgerQueryFailed { .. }));
    }

    #[test]
    fn test_to_description_reads_key_schema() {
        let table = DynamoTableDescription::builder()
            .table_status(TableStatus::Creating)
            .key_schema(key_element("job_name", KeyType::Hash).unwrap())
            .key_schema(key_element("bookmark_timestamp", KeyType::Range).unwrap())
            .build();

        let description = to_description("bookmarks", &table);
        assert_eq!(description.state, TableState::Creating);
        assert_eq!(description.partition_key.as_deref(), Some("job_name"));
        assert_eq!(description.sort_key.as_deref(), Some("bookmark_timestamp"));
    }
}
