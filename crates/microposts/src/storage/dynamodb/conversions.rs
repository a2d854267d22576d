//! Conversions between store-neutral records and DynamoDB items.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as DynamoValue;
use microposts_core::storage::keys::{PARTITION_KEY, SORT_KEY};
use microposts_core::storage::{AttributeValue, PrimaryKey, Record, StoreError};

pub type Item = HashMap<String, DynamoValue>;

pub fn value_to_dynamo(value: &AttributeValue) -> DynamoValue {
    match value {
        AttributeValue::S(s) => DynamoValue::S(s.clone()),
        AttributeValue::N(n) => DynamoValue::N(n.to_string()),
        AttributeValue::Bool(b) => DynamoValue::Bool(*b),
    }
}

pub fn value_from_dynamo(name: &str, value: &DynamoValue) -> Result<AttributeValue, StoreError> {
    match value {
        DynamoValue::S(s) => Ok(AttributeValue::S(s.clone())),
        DynamoValue::N(n) => n.parse().map(AttributeValue::N).map_err(|e| {
            StoreError::InvalidData(format!("Invalid number in field {name}: {e}"))
        }),
        DynamoValue::Bool(b) => Ok(AttributeValue::Bool(*b)),
        other => Err(StoreError::InvalidData(format!(
            "Unsupported attribute type in field {name}: {other:?}"
        ))),
    }
}

/// Key attributes only, as used by GetItem, DeleteItem and UpdateItem.
pub fn key_to_item(key: &PrimaryKey) -> Item {
    let mut item = HashMap::new();
    item.insert(
        PARTITION_KEY.to_string(),
        DynamoValue::S(key.partition.clone()),
    );
    item.insert(SORT_KEY.to_string(), DynamoValue::S(key.sort.clone()));
    item
}

pub fn record_to_item(record: &Record) -> Item {
    let mut item = key_to_item(&record.key);
    for (name, value) in &record.attributes {
        item.insert(name.clone(), value_to_dynamo(value));
    }
    item
}

pub fn item_to_record(item: &Item) -> Result<Record, StoreError> {
    let key_part = |name: &str| {
        item.get(name)
            .and_then(|v| v.as_s().ok())
            .cloned()
            .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {name}")))
    };

    let mut record = Record::new(PrimaryKey::new(
        key_part(PARTITION_KEY)?,
        key_part(SORT_KEY)?,
    ));

    for (name, value) in item {
        if name == PARTITION_KEY || name == SORT_KEY {
            continue;
        }
        record
            .attributes
            .insert(name.clone(), value_from_dynamo(name, value)?);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new(PrimaryKey::new("User-00000000001", "00000000001"))
            .with("EntityType", "User")
            .with("ID", 1_u64)
            .with("Version", 2_u64)
            .with("Exists", true)
    }

    #[test]
    fn test_record_to_item() {
        let item = record_to_item(&sample());

        assert_eq!(
            item.get("PK"),
            Some(&DynamoValue::S("User-00000000001".to_string()))
        );
        assert_eq!(
            item.get("SK"),
            Some(&DynamoValue::S("00000000001".to_string()))
        );
        assert_eq!(item.get("Version"), Some(&DynamoValue::N("2".to_string())));
        assert_eq!(item.get("Exists"), Some(&DynamoValue::Bool(true)));
        assert_eq!(item.len(), 6);
    }

    #[test]
    fn test_item_to_record() {
        let item = record_to_item(&sample());
        assert_eq!(item_to_record(&item).unwrap(), sample());
    }

    #[test]
    fn test_item_without_sort_key_is_invalid() {
        let mut item = record_to_item(&sample());
        item.remove("SK");
        assert!(matches!(
            item_to_record(&item),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_non_integer_number_is_invalid() {
        let mut item = record_to_item(&sample());
        item.insert("Version".to_string(), DynamoValue::N("1.5".to_string()));
        assert!(matches!(
            item_to_record(&item),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_unsupported_type_is_invalid() {
        let mut item = record_to_item(&sample());
        item.insert("Tags".to_string(), DynamoValue::Ss(vec!["a".to_string()]));
        assert!(matches!(
            item_to_record(&item),
            Err(StoreError::InvalidData(_))
        ));
    }
}
