//! Mapping between domain entities and table records.
//!
//! Every entity row carries the same bookkeeping attributes next to its own
//! fields. The [`Entity`] trait supplies the type-specific part; [`to_record`]
//! and [`from_record`] handle the rest.

use chrono::{DateTime, Utc};

use crate::model::{Metadata, Micropost, RecordState, User};

use super::condition::Condition;
use super::keys::{entity_key, partition_prefix, shadow_key, PARTITION_KEY};
use super::record::{Attributes, PrimaryKey, Record};
use super::StoreError;

// ============================================================================
// Attribute names
// ============================================================================

pub const ENTITY_TYPE: &str = "EntityType";
pub const ID: &str = "ID";
pub const VERSION: &str = "Version";
pub const CREATED_AT: &str = "CreatedAt";
pub const UPDATED_AT: &str = "UpdatedAt";

pub const USER_NAME: &str = "Name";
pub const USER_EMAIL: &str = "Email";
pub const MICROPOST_CONTENT: &str = "Content";
pub const MICROPOST_USER_ID: &str = "UserID";

pub const SHADOW_EXISTS: &str = "Exists";
pub const SHADOW_OWNER: &str = "UserID";

// ============================================================================
// Entity trait
// ============================================================================

/// A domain type stored as one row of the table.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Type name used in keys and in the `EntityType` attribute.
    const ENTITY_NAME: &'static str;

    fn metadata(&self) -> &Metadata;

    fn metadata_mut(&mut self) -> &mut Metadata;

    /// Writes the type-specific attributes.
    fn write_fields(&self, attributes: &mut Attributes);

    /// Rebuilds the entity from its type-specific attributes.
    fn read_fields(metadata: Metadata, record: &Record) -> Result<Self, StoreError>;

    fn id(&self) -> u64 {
        self.metadata().id
    }

    fn primary_key(&self) -> PrimaryKey {
        entity_key(Self::ENTITY_NAME, self.id())
    }

    /// Scan filter selecting every row of this type.
    fn type_filter() -> Condition {
        Condition::begins_with(PARTITION_KEY, partition_prefix(Self::ENTITY_NAME))
            .and(Condition::equals(ENTITY_TYPE, Self::ENTITY_NAME))
    }
}

/// Serializes `entity` with the given version and update timestamp.
pub fn to_record<E: Entity>(entity: &E, version: u64, updated_at: DateTime<Utc>) -> Record {
    let meta = entity.metadata();
    let mut record = Record::new(entity.primary_key())
        .with(ENTITY_TYPE, E::ENTITY_NAME)
        .with(ID, meta.id)
        .with(VERSION, version)
        .with(CREATED_AT, meta.created_at.to_rfc3339())
        .with(UPDATED_AT, updated_at.to_rfc3339());

    entity.write_fields(&mut record.attributes);
    record
}

/// Deserializes a stored row into a persisted entity.
pub fn from_record<E: Entity>(record: &Record) -> Result<E, StoreError> {
    let entity_type = record.get_string(ENTITY_TYPE)?;
    if entity_type != E::ENTITY_NAME {
        return Err(StoreError::InvalidData(format!(
            "Expected {} row at {}, found {entity_type}",
            E::ENTITY_NAME,
            record.key
        )));
    }

    let metadata = Metadata {
        id: record.get_number(ID)?,
        state: RecordState::Persisted {
            version: record.get_number(VERSION)?,
        },
        created_at: record.get_datetime(CREATED_AT)?,
        updated_at: record.get_datetime(UPDATED_AT)?,
    };

    E::read_fields(metadata, record)
}

// ============================================================================
// Entity implementations
// ============================================================================

impl Entity for User {
    const ENTITY_NAME: &'static str = "User";

    fn metadata(&self) -> &Metadata {
        &self.meta
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.meta
    }

    fn write_fields(&self, attributes: &mut Attributes) {
        attributes.insert(USER_NAME.to_string(), self.name.clone().into());
        attributes.insert(USER_EMAIL.to_string(), self.email.clone().into());
    }

    fn read_fields(meta: Metadata, record: &Record) -> Result<Self, StoreError> {
        Ok(User {
            meta,
            name: record.get_string(USER_NAME)?,
            email: record.get_string(USER_EMAIL)?,
        })
    }
}

impl Entity for Micropost {
    const ENTITY_NAME: &'static str = "Micropost";

    fn metadata(&self) -> &Metadata {
        &self.meta
    }

    fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.meta
    }

    fn write_fields(&self, attributes: &mut Attributes) {
        attributes.insert(MICROPOST_CONTENT.to_string(), self.content.clone().into());
        attributes.insert(MICROPOST_USER_ID.to_string(), self.user_id.into());
    }

    fn read_fields(meta: Metadata, record: &Record) -> Result<Self, StoreError> {
        Ok(Micropost {
            meta,
            user_id: record.get_number(MICROPOST_USER_ID)?,
            content: record.get_string(MICROPOST_CONTENT)?,
        })
    }
}

// ============================================================================
// Uniqueness shadows
// ============================================================================

/// Reservation row proving that `owner_id` holds `value` among all rows of
/// `entity_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueShadow {
    pub value: String,
    pub entity_type: &'static str,
    pub owner_id: u64,
}

impl UniqueShadow {
    pub fn new(value: impl Into<String>, entity_type: &'static str, owner_id: u64) -> Self {
        Self {
            value: value.into(),
            entity_type,
            owner_id,
        }
    }

    pub fn key(&self) -> PrimaryKey {
        shadow_key(&self.value, self.entity_type)
    }

    pub fn to_record(&self) -> Record {
        Record::new(self.key())
            .with(SHADOW_EXISTS, true)
            .with(SHADOW_OWNER, self.owner_id)
    }

    /// Holds when the value is free or already reserved by the same owner.
    pub fn owned_or_free(&self) -> Condition {
        Condition::attribute_not_exists(SHADOW_EXISTS)
            .or(Condition::equals(SHADOW_OWNER, self.owner_id))
    }
}
