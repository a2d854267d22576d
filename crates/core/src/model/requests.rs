//! API request types and their validation.
//!
//! Validation is pure: each request reports every failing field at once so the
//! HTTP layer can return them together.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::FieldError;
use super::types::{Micropost, User};

/// Maximum length of a micropost, in characters.
pub const MAX_CONTENT_LENGTH: usize = 140;

/// Field name -> failure, ordered by field name.
pub type FieldErrors = BTreeMap<&'static str, FieldError>;

/// Request payload for creating or replacing a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub email: String,
}

impl UserRequest {
    pub fn new(user_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            email: email.into(),
        }
    }

    /// Checks required fields and the email format.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.user_name.trim().is_empty() {
            errors.insert("user_name", FieldError::Required);
        }

        if self.email.trim().is_empty() {
            errors.insert("email", FieldError::Required);
        } else if !is_valid_email(&self.email) {
            errors.insert("email", FieldError::InvalidEmail);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Converts into a new, unsaved user.
    pub fn into_user(self) -> User {
        User::new(self.user_name, self.email)
    }

    /// Overwrites the mutable fields of an existing user.
    pub fn apply_to(self, user: &mut User) {
        user.name = self.user_name;
        user.email = self.email;
    }
}

/// Request payload for creating or replacing a micropost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicropostRequest {
    #[serde(default)]
    pub content: String,
}

impl MicropostRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Checks that content is present and fits the length limit.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if self.content.trim().is_empty() {
            errors.insert("content", FieldError::Required);
        } else if self.content.chars().count() > MAX_CONTENT_LENGTH {
            errors.insert(
                "content",
                FieldError::TooLong {
                    max: MAX_CONTENT_LENGTH,
                },
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_micropost(self, user_id: u64) -> Micropost {
        Micropost::new(user_id, self.content)
    }

    pub fn apply_to(self, micropost: &mut Micropost) {
        micropost.content = self.content;
    }
}

/// Minimal structural email check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}
