mod condition;
mod entity;
mod error;
mod http_mapping;
pub mod keys;
mod record;
mod traits;

pub use condition::Condition;
pub use entity::{
    from_record, to_record, Entity, UniqueShadow, CREATED_AT, ENTITY_TYPE, ID,
    MICROPOST_CONTENT, MICROPOST_USER_ID, SHADOW_EXISTS, SHADOW_OWNER, UPDATED_AT, USER_EMAIL,
    USER_NAME, VERSION,
};
pub use error::{RepositoryError, Result, StoreError};
pub use http_mapping::repository_error_to_status_code;
pub use record::{AttributeValue, Attributes, PrimaryKey, Record};
pub use traits::{ConditionalPut, TableStore, WriteOp};
