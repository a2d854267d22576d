use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether an in-memory entity has been written to the table yet.
///
/// Repositories route `Unsaved` entities to the create path and `Persisted`
/// ones to the version-checked update path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecordState {
    Unsaved,
    Persisted { version: u64 },
}

impl RecordState {
    /// Version last read from or written to the table, if any.
    pub fn version(&self) -> Option<u64> {
        match self {
            RecordState::Unsaved => None,
            RecordState::Persisted { version } => Some(*version),
        }
    }
}

/// Bookkeeping shared by every entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Surrogate id; `0` until the entity is created.
    pub id: u64,
    pub state: RecordState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Metadata {
    pub fn unsaved() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            state: RecordState::Unsaved,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn version(&self) -> Option<u64> {
        self.state.version()
    }
}

/// A registered user. The email address is unique across users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub meta: Metadata,
    pub name: String,
    pub email: String,
}

impl User {
    /// Creates a new, not yet persisted user.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            meta: Metadata::unsaved(),
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.meta.id
    }

    pub fn version(&self) -> Option<u64> {
        self.meta.version()
    }
}

/// A short text post owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Micropost {
    #[serde(flatten)]
    pub meta: Metadata,
    pub user_id: u64,
    pub content: String,
}

impl Micropost {
    /// Creates a new, not yet persisted micropost for `user_id`.
    pub fn new(user_id: u64, content: impl Into<String>) -> Self {
        Self {
            meta: Metadata::unsaved(),
            user_id,
            content: content.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.meta.id
    }

    pub fn version(&self) -> Option<u64> {
        self.meta.version()
    }
}
