//! DynamoDB table implementation.
//!
//! Implements `TableStore` from `microposts_core::storage` using DynamoDB.

use async_trait::async_trait;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::types::{
    AttributeValue as DynamoValue, Delete, Put, ReturnValue, TransactWriteItem,
};
use aws_sdk_dynamodb::Client;

use microposts_core::storage::{
    Condition, ConditionalPut, PrimaryKey, Record, StoreError, TableStore, WriteOp,
};

use super::conversions::{item_to_record, key_to_item, record_to_item};
use super::error::{
    map_delete_item_error, map_get_item_error, map_put_item_error, map_scan_error,
    map_transact_write_error, map_update_item_error,
};
use super::expressions::Expression;
use crate::config::Config;

/// DynamoDB-backed table.
pub struct DynamoDbStore {
    client: Client,
    table_name: String,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client and table name.
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    /// Creates a store from application configuration.
    ///
    /// Uses the AWS SDK default credential chain, or static dummy credentials
    /// when a local endpoint is configured.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.dynamo_endpoint {
            loader = loader
                .endpoint_url(endpoint)
                .credentials_provider(Credentials::new("dummy", "dummy", None, None, "local"));
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config), config.table_name.clone())
    }

    /// Get the table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn transact_item(&self, op: WriteOp) -> Result<TransactWriteItem, StoreError> {
        let build_error = |e: aws_sdk_dynamodb::error::BuildError| {
            StoreError::InvalidData(format!("Invalid transaction item: {e}"))
        };

        match op {
            WriteOp::Put(put) => {
                let expression = put.condition.as_ref().map(Expression::from_condition);
                let builder = Put::builder()
                    .table_name(&self.table_name)
                    .set_item(Some(record_to_item(&put.record)));
                let builder = match expression {
                    Some(expr) => builder
                        .condition_expression(expr.text.clone())
                        .set_expression_attribute_names(Some(expr.names.clone()))
                        .set_expression_attribute_values(expr.values()),
                    None => builder,
                };
                Ok(TransactWriteItem::builder()
                    .put(builder.build().map_err(build_error)?)
                    .build())
            }
            WriteOp::Delete { key, condition } => {
                let expression = condition.as_ref().map(Expression::from_condition);
                let builder = Delete::builder()
                    .table_name(&self.table_name)
                    .set_key(Some(key_to_item(&key)));
                let builder = match expression {
                    Some(expr) => builder
                        .condition_expression(expr.text.clone())
                        .set_expression_attribute_names(Some(expr.names.clone()))
                        .set_expression_attribute_values(expr.values()),
                    None => builder,
                };
                Ok(TransactWriteItem::builder()
                    .delete(builder.build().map_err(build_error)?)
                    .build())
            }
        }
    }
}

#[async_trait]
impl TableStore for DynamoDbStore {
    async fn get_item(&self, key: &PrimaryKey) -> Result<Option<Record>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_item(key)))
            .consistent_read(true)
            .send()
            .await
            .map_err(map_get_item_error)?;

        match result.item {
            Some(item) => Ok(Some(item_to_record(&item)?)),
            None => Ok(None),
        }
    }

    async fn put_item(&self, put: ConditionalPut) -> Result<(), StoreError> {
        let mut request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record_to_item(&put.record)));

        if let Some(condition) = &put.condition {
            let expr = Expression::from_condition(condition);
            request = request
                .condition_expression(expr.text.clone())
                .set_expression_attribute_names(Some(expr.names.clone()))
                .set_expression_attribute_values(expr.values());
        }

        request.send().await.map_err(map_put_item_error)?;
        Ok(())
    }

    async fn delete_item(&self, key: &PrimaryKey) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_item(key)))
            .send()
            .await
            .map_err(map_delete_item_error)?;

        Ok(())
    }

    async fn add_to_counter(
        &self,
        key: &PrimaryKey,
        attribute: &str,
        delta: u64,
    ) -> Result<u64, StoreError> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(key_to_item(key)))
            .update_expression("ADD #counter :delta")
            .expression_attribute_names("#counter", attribute)
            .expression_attribute_values(":delta", DynamoValue::N(delta.to_string()))
            .return_values(ReturnValue::UpdatedNew)
            .send()
            .await
            .map_err(map_update_item_error)?;

        result
            .attributes
            .as_ref()
            .and_then(|attributes| attributes.get(attribute))
            .and_then(|value| value.as_n().ok())
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| {
                StoreError::InvalidData(format!("Counter {attribute} at {key} missing from response"))
            })
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let items = ops
            .into_iter()
            .map(|op| self.transact_item(op))
            .collect::<Result<Vec<_>, _>>()?;

        self.client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await
            .map_err(map_transact_write_error)?;

        Ok(())
    }

    async fn scan(&self, filter: &Condition) -> Result<Vec<Record>, StoreError> {
        let expr = Expression::from_condition(filter);
        let mut records = Vec::new();
        let mut start_key = None;

        loop {
            let result = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression(expr.text.clone())
                .set_expression_attribute_names(Some(expr.names.clone()))
                .set_expression_attribute_values(expr.values())
                .consistent_read(true)
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(map_scan_error)?;

            for item in result.items() {
                records.push(item_to_record(item)?);
            }

            match result.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        tracing::debug!(table = %self.table_name, count = records.len(), "Scan complete");
        Ok(records)
    }
}
