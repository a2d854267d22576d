use thiserror::Error;

/// A single field validation failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("is required")]
    Required,
    #[error("is not a valid email address")]
    InvalidEmail,
    #[error("is longer than {max} characters")]
    TooLong { max: usize },
    #[error("is already taken")]
    AlreadyTaken,
}

impl FieldError {
    /// Renders the failure with the human-readable name of `field`.
    pub fn message_for(&self, field: &str) -> String {
        format!("{} {}", display_name(field), self)
    }
}

/// Human-readable name of a request field.
pub fn display_name(field: &str) -> &str {
    match field {
        "user_id" => "User ID",
        "user_name" => "User name",
        "micropost_id" => "Micropost ID",
        "email" => "Email address",
        "content" => "Content",
        other => other,
    }
}
