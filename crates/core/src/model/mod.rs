mod error;
mod requests;
mod types;

pub use error::{display_name, FieldError};
pub use requests::{
    is_valid_email, FieldErrors, MicropostRequest, UserRequest, MAX_CONTENT_LENGTH,
};
pub use types::{Metadata, Micropost, RecordState, User};
