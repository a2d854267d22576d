//! Single-table key generation.
//!
//! Pure functions for generating partition and sort keys. Every entity row,
//! counter row and uniqueness shadow row shares one table, so the key shapes
//! below are the only thing keeping them apart.

use super::record::PrimaryKey;

// ============================================================================
// Key attributes and constants
// ============================================================================

/// Name of the partition key attribute.
pub const PARTITION_KEY: &str = "PK";

/// Name of the sort key attribute.
pub const SORT_KEY: &str = "SK";

/// Width ids are zero-padded to inside keys.
pub const ID_WIDTH: usize = 11;

/// Largest id that still fits the padded key width.
pub const MAX_ID: u64 = 99_999_999_999;

pub const COUNTER_PREFIX: &str = "AtomicCounter-";
pub const COUNTER_SORT_KEY: &str = "AtomicCounter";
pub const COUNTER_ATTRIBUTE: &str = "CurrentNumber";

// ============================================================================
// Entity keys
// ============================================================================

/// Generate the partition key for an entity.
///
/// Pattern: `<EntityType>-<id padded to 11 digits>`
pub fn partition_key(entity_type: &str, id: u64) -> String {
    format!("{entity_type}-{id:0width$}", width = ID_WIDTH)
}

/// Generate the sort key for an entity.
///
/// Pattern: `<id padded to 11 digits>`
pub fn sort_key(id: u64) -> String {
    format!("{id:0width$}", width = ID_WIDTH)
}

/// Full primary key of an entity row.
pub fn entity_key(entity_type: &str, id: u64) -> PrimaryKey {
    PrimaryKey::new(partition_key(entity_type, id), sort_key(id))
}

/// Prefix shared by the partition keys of every row of an entity type.
///
/// Pattern: `<EntityType>-`
pub fn partition_prefix(entity_type: &str) -> String {
    format!("{entity_type}-")
}

/// Returns true if `id` can be encoded without breaking key ordering.
pub fn is_valid_id(id: u64) -> bool {
    (1..=MAX_ID).contains(&id)
}

// ============================================================================
// Counter keys
// ============================================================================

/// Primary key of the id counter for an entity type.
///
/// Pattern: `AtomicCounter-<EntityType>` / `AtomicCounter`
pub fn counter_key(entity_type: &str) -> PrimaryKey {
    PrimaryKey::new(format!("{COUNTER_PREFIX}{entity_type}"), COUNTER_SORT_KEY)
}

// ============================================================================
// Uniqueness shadow keys
// ============================================================================

/// Primary key of the shadow row that reserves a unique value.
///
/// Pattern: `<value>` / `<EntityType>`
pub fn shadow_key(value: &str, entity_type: &str) -> PrimaryKey {
    PrimaryKey::new(value, entity_type)
}

// ============================================================================
// Table name
// ============================================================================

pub const DEFAULT_PROJECT_NAME: &str = "microposts";
pub const DEFAULT_TABLE_NAME: &str = "main";

/// Resolves the table name from settings looked up through `var`.
///
/// `TEST_DYNAMO_TABLE_NAME` wins outright. Otherwise the name is
/// `<PROJECT_NAME>-<DYNAMO_TABLE_NAME>[-<DYNAMO_TABLE_VERSION>]`. Empty values
/// count as unset.
pub fn resolve_table_name(var: impl Fn(&str) -> Option<String>) -> String {
    let var = |name: &str| var(name).filter(|value| !value.is_empty());

    if let Some(name) = var("TEST_DYNAMO_TABLE_NAME") {
        return name;
    }

    let project = var("PROJECT_NAME").unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
    let table = var("DYNAMO_TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());
    match var("DYNAMO_TABLE_VERSION") {
        Some(version) => format!("{project}-{table}-{version}"),
        None => format!("{project}-{table}"),
    }
}
