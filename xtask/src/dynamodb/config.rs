//! Table configuration types (Functional Core - pure data).

use microposts_core::storage::keys::{resolve_table_name, PARTITION_KEY, SORT_KEY};

/// Table schema configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub table_name: String,
    pub partition_key: KeyAttribute,
    pub sort_key: KeyAttribute,
    pub billing_mode: BillingMode,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    fn string(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attribute_type: AttributeType::String,
        }
    }
}

/// DynamoDB attribute types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
}

/// Billing mode for the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingMode {
    PayPerRequest,
}

impl TableConfig {
    /// Sets the table name.
    pub fn with_table_name(mut self, name: &str) -> Self {
        self.table_name = name.to_string();
        self
    }
}

/// The single table holding users, microposts, counters and email
/// reservations. Every row is addressed by `PK` + `SK`.
pub fn microposts_table_config() -> TableConfig {
    TableConfig {
        table_name: default_table_name(),
        partition_key: KeyAttribute::string(PARTITION_KEY),
        sort_key: KeyAttribute::string(SORT_KEY),
        billing_mode: BillingMode::PayPerRequest,
    }
}

/// Table name the server resolves from the same environment variables.
pub fn default_table_name() -> String {
    resolve_table_name(|name| std::env::var(name).ok())
}
