use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use microposts_core::model::{User, UserRequest};
use microposts_core::storage::{Entity, RepositoryError};

use super::error::{AppError, ValidationError};
use super::extract::{AppJson, AppPath};
use super::responses::{CreatedResponse, MessageResponse, UserResponse, UsersResponse};
use crate::state::AppState;

/// Create a user (POST /users).
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(ValidationError)?;

    let user = state.users.create(&payload.into_user()).await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse::new(user.id()))))
}

/// List all users (GET /users).
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, AppError> {
    let users = state.users.list().await?;

    Ok(Json(UsersResponse {
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// Get a single user (GET /users/{user_id}).
pub async fn get_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<u64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .get(user_id)
        .await?
        .ok_or(RepositoryError::NotFound {
            entity_type: User::ENTITY_NAME,
            id: user_id,
        })?;

    Ok(Json(user.into()))
}

/// Replace a user's name and email (PUT /users/{user_id}).
pub async fn update_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<u64>,
    AppJson(payload): AppJson<UserRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate().map_err(ValidationError)?;

    state
        .users
        .update_with(user_id, |user| payload.apply_to(user))
        .await?;

    Ok(Json(MessageResponse::ok()))
}

/// Delete a user (DELETE /users/{user_id}). Deleting a missing user succeeds.
pub async fn delete_user(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<u64>,
) -> Result<Json<MessageResponse>, AppError> {
    state.users.delete(user_id).await?;

    Ok(Json(MessageResponse::ok()))
}
