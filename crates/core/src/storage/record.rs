//! Store-neutral item representation.
//!
//! A [`Record`] is one row of the table: its primary key plus a flat map of
//! attributes. Backends translate records to and from their native item type.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::keys::{PARTITION_KEY, SORT_KEY};
use super::StoreError;

/// Partition key and sort key of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimaryKey {
    pub partition: String,
    pub sort: String,
}

impl PrimaryKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }
}

impl std::fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.partition, self.sort)
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    S(String),
    N(u64),
    Bool(bool),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<u64> {
        match self {
            AttributeValue::N(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::S(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::S(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::N(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

/// Non-key attributes of a row, ordered by name.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: PrimaryKey,
    pub attributes: Attributes,
}

impl Record {
    pub fn new(key: PrimaryKey) -> Self {
        Self {
            key,
            attributes: Attributes::new(),
        }
    }

    /// Sets an attribute, builder style.
    pub fn with(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    /// Looks up an attribute by name, including the key attributes.
    pub fn attribute(&self, name: &str) -> Option<AttributeValue> {
        match name {
            PARTITION_KEY => Some(AttributeValue::S(self.key.partition.clone())),
            SORT_KEY => Some(AttributeValue::S(self.key.sort.clone())),
            _ => self.attributes.get(name).cloned(),
        }
    }

    /// Get a required string attribute.
    pub fn get_string(&self, name: &str) -> Result<String, StoreError> {
        self.attributes
            .get(name)
            .and_then(AttributeValue::as_s)
            .map(str::to_string)
            .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {name}")))
    }

    /// Get a required numeric attribute.
    pub fn get_number(&self, name: &str) -> Result<u64, StoreError> {
        self.attributes
            .get(name)
            .and_then(AttributeValue::as_n)
            .ok_or_else(|| StoreError::InvalidData(format!("Missing or invalid field: {name}")))
    }

    /// Get a required datetime attribute (RFC 3339 format).
    pub fn get_datetime(&self, name: &str) -> Result<DateTime<Utc>, StoreError> {
        let s = self.get_string(name)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| StoreError::InvalidData(format!("Invalid datetime {name}: {e}")))
    }
}
