use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use microposts_core::model::{FieldError, FieldErrors};
use microposts_core::storage::{repository_error_to_status_code, RepositoryError};

use super::responses::{
    InvalidInputResponse, MessageResponse, NOT_FOUND_MESSAGE, SERVER_ERROR_MESSAGE,
};

/// Request body failed validation.
#[derive(Debug, Error)]
#[error("Invalid request fields: {}", .0.keys().copied().collect::<Vec<_>>().join(", "))]
pub struct ValidationError(pub FieldErrors);

/// Request body or path could not be decoded.
#[derive(Debug, Error)]
#[error("Malformed request {part}: {detail}")]
pub struct MalformedRequest {
    pub part: &'static str,
    pub detail: String,
}

impl MalformedRequest {
    pub fn new(part: &'static str, detail: impl Into<String>) -> Self {
        Self {
            part,
            detail: detail.into(),
        }
    }
}

pub struct AppError(pub anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(ValidationError(errors)) = self.0.downcast_ref::<ValidationError>() {
            tracing::warn!(error = %self.0, "Rejected request");
            return (
                StatusCode::BAD_REQUEST,
                Json(InvalidInputResponse::from_field_errors(errors)),
            )
                .into_response();
        }

        if let Some(MalformedRequest { part, detail }) = self.0.downcast_ref::<MalformedRequest>()
        {
            tracing::warn!(error = %self.0, "Rejected request");
            return (
                StatusCode::BAD_REQUEST,
                Json(InvalidInputResponse::single(part, detail)),
            )
                .into_response();
        }

        let Some(repo_error) = self.0.downcast_ref::<RepositoryError>() else {
            tracing::error!(error = ?self.0, "Unhandled error");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(MessageResponse::new(SERVER_ERROR_MESSAGE)),
            )
                .into_response();
        };

        if let RepositoryError::UniquenessConflict { field, .. } = repo_error {
            tracing::warn!(error = %repo_error, "Rejected request");
            let mut errors = FieldErrors::new();
            errors.insert(*field, FieldError::AlreadyTaken);
            return (
                StatusCode::BAD_REQUEST,
                Json(InvalidInputResponse::from_field_errors(&errors)),
            )
                .into_response();
        }

        let status_code = StatusCode::from_u16(repository_error_to_status_code(repo_error))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match status_code {
            StatusCode::NOT_FOUND => NOT_FOUND_MESSAGE.to_string(),
            status if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE => {
                tracing::error!(error = %repo_error, "Repository error");
                SERVER_ERROR_MESSAGE.to_string()
            }
            _ => {
                tracing::warn!(error = %repo_error, "Repository error");
                repo_error.to_string()
            }
        };

        (status_code, Json(MessageResponse::new(message))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
