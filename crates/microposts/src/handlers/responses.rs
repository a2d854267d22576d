//! JSON response bodies.

use std::collections::BTreeMap;

use serde::Serialize;

use microposts_core::model::{FieldErrors, Micropost, User};

pub const OK_MESSAGE: &str = "OK";
pub const INVALID_INPUT_MESSAGE: &str = "Please check your input.";
pub const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
pub const SERVER_ERROR_MESSAGE: &str = "An internal server error occurred.";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(OK_MESSAGE)
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: String,
    pub id: u64,
}

impl CreatedResponse {
    pub fn new(id: u64) -> Self {
        Self {
            message: OK_MESSAGE.to_string(),
            id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvalidInputResponse {
    pub message: String,
    pub errors: BTreeMap<String, String>,
}

impl InvalidInputResponse {
    pub fn from_field_errors(errors: &FieldErrors) -> Self {
        Self {
            message: INVALID_INPUT_MESSAGE.to_string(),
            errors: errors
                .iter()
                .map(|(field, error)| (field.to_string(), error.message_for(field)))
                .collect(),
        }
    }

    /// A single error keyed by the request part it concerns.
    pub fn single(part: &str, message: &str) -> Self {
        Self {
            message: INVALID_INPUT_MESSAGE.to_string(),
            errors: BTreeMap::from([(part.to_string(), message.to_string())]),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: u64,
    pub user_name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id(),
            user_name: user.name,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct MicropostResponse {
    pub id: u64,
    pub user_id: u64,
    pub content: String,
}

impl From<Micropost> for MicropostResponse {
    fn from(micropost: Micropost) -> Self {
        Self {
            id: micropost.id(),
            user_id: micropost.user_id,
            content: micropost.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MicropostsResponse {
    pub microposts: Vec<MicropostResponse>,
}
