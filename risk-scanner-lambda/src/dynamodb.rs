use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use aws_sdk_dynamodb::Client;
use aws_types::SdkConfig;
use log::trace;

use cfn_risk_scanner::{AttributeValue, Error, Item, KeyValueStore, Result};

/// The rules table, read and bootstrapped through DynamoDB.
#[derive(Clone, Debug)]
pub struct DynamoDbRuleTable {
    client: Client,
}

impl DynamoDbRuleTable {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        DynamoDbRuleTable {
            client: Client::new(sdk_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        DynamoDbRuleTable { client }
    }
}

fn store_error<E: std::error::Error + 'static>(err: E) -> Error {
    Error::StoreUnavailable(DisplayErrorContext(&err).to_string())
}

/// Attributes of types the rules schema never uses are dropped.
pub fn decode_item(item: &HashMap<String, DynamoValue>) -> Item {
    item.iter()
        .filter_map(|(name, value)| {
            let decoded = match value {
                DynamoValue::S(s) => AttributeValue::S(s.clone()),
                DynamoValue::N(n) => AttributeValue::N(n.clone()),
                DynamoValue::Bool(b) => AttributeValue::Bool(*b),
                other => {
                    trace!("Ignoring attribute {} of unsupported shape {:?}", name, other);
                    return None;
                }
            };
            Some((name.clone(), decoded))
        })
        .collect()
}

pub fn encode_item(item: Item) -> HashMap<String, DynamoValue> {
    item.into_iter()
        .map(|(name, value)| {
            let encoded = match value {
                AttributeValue::S(s) => DynamoValue::S(s),
                AttributeValue::N(n) => DynamoValue::N(n),
                AttributeValue::Bool(b) => DynamoValue::Bool(b),
            };
            (name, encoded)
        })
        .collect()
}

#[async_trait]
impl KeyValueStore for DynamoDbRuleTable {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let mut tables = Vec::new();
        let mut start = None;
        loop {
            let page = self
                .client
                .list_tables()
                .set_exclusive_start_table_name(start.take())
                .send()
                .await
                .map_err(store_error)?;
            tables.extend(page.table_names().iter().cloned());
            match page.last_evaluated_table_name() {
                Some(last) => start = Some(last.to_string()),
                None => break,
            }
        }
        Ok(tables)
    }

    async fn scan(&self, table: &str) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let mut start_key = None;
        loop {
            let page = self
                .client
                .scan()
                .table_name(table)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(store_error)?;
            items.extend(page.items().iter().map(decode_item));
            match page.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }
        Ok(items)
    }

    async fn get_item(&self, table: &str, key_attribute: &str, key: &str) -> Result<Option<Item>> {
        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(key_attribute, DynamoValue::S(key.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(store_error)?;
        Ok(output.item().map(decode_item))
    }

    async fn put_item_if_absent(&self, table: &str, key_attribute: &str, item: Item) -> Result<bool> {
        let result = self
            .client
            .put_item()
            .table_name(table)
            .set_item(Some(encode_item(item)))
            .condition_expression("attribute_not_exists(#key)")
            .expression_attribute_names("#key", key_attribute)
            .send()
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(err) => match err.into_service_error() {
                PutItemError::ConditionalCheckFailedException(_) => Ok(false),
                other => Err(store_error(other)),
            },
        }
    }
}
