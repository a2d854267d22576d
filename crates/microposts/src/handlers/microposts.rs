//! Micropost endpoints, nested under their owner.
//!
//! A micropost addressed through a user it does not belong to is reported as
//! not found.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use microposts_core::model::{Micropost, MicropostRequest};
use microposts_core::storage::{Entity, RepositoryError};

use super::error::{AppError, ValidationError};
use super::extract::{AppJson, AppPath};
use super::responses::{CreatedResponse, MessageResponse, MicropostResponse, MicropostsResponse};
use crate::state::AppState;

/// Loads micropost `micropost_id` if it belongs to `user_id`.
async fn owned_micropost(
    state: &AppState,
    user_id: u64,
    micropost_id: u64,
) -> Result<Option<Micropost>, RepositoryError> {
    let micropost = state.microposts.get(micropost_id).await?;
    Ok(micropost.filter(|m| m.user_id == user_id))
}

fn not_found(micropost_id: u64) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type: Micropost::ENTITY_NAME,
        id: micropost_id,
    }
}

/// Create a micropost (POST /users/{user_id}/microposts).
pub async fn create_micropost(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<u64>,
    AppJson(payload): AppJson<MicropostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(ValidationError)?;

    let micropost = state
        .microposts
        .create(&payload.into_micropost(user_id))
        .await?;

    tracing::info!(micropost_id = micropost.id(), user_id, "Created micropost");

    Ok((StatusCode::CREATED, Json(CreatedResponse::new(micropost.id()))))
}

/// List a user's microposts (GET /users/{user_id}/microposts).
pub async fn list_microposts(
    State(state): State<AppState>,
    AppPath(user_id): AppPath<u64>,
) -> Result<Json<MicropostsResponse>, AppError> {
    let microposts = state.microposts.list_by_user(user_id).await?;

    Ok(Json(MicropostsResponse {
        microposts: microposts.into_iter().map(MicropostResponse::from).collect(),
    }))
}

/// Get a micropost (GET /users/{user_id}/microposts/{micropost_id}).
pub async fn get_micropost(
    State(state): State<AppState>,
    AppPath((user_id, micropost_id)): AppPath<(u64, u64)>,
) -> Result<Json<MicropostResponse>, AppError> {
    let micropost = owned_micropost(&state, user_id, micropost_id)
        .await?
        .ok_or_else(|| not_found(micropost_id))?;

    Ok(Json(micropost.into()))
}

/// Replace a micropost's content (PUT /users/{user_id}/microposts/{micropost_id}).
pub async fn update_micropost(
    State(state): State<AppState>,
    AppPath((user_id, micropost_id)): AppPath<(u64, u64)>,
    AppJson(payload): AppJson<MicropostRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload.validate().map_err(ValidationError)?;

    let mut micropost = owned_micropost(&state, user_id, micropost_id)
        .await?
        .ok_or_else(|| not_found(micropost_id))?;

    // Guarded by the version read above.
    payload.apply_to(&mut micropost);
    state.microposts.save(&micropost).await?;

    tracing::info!(micropost_id, user_id, "Updated micropost");

    Ok(Json(MessageResponse::ok()))
}

/// Delete a micropost (DELETE /users/{user_id}/microposts/{micropost_id}).
///
/// Missing microposts succeed. Microposts of another user are not found.
pub async fn delete_micropost(
    State(state): State<AppState>,
    AppPath((user_id, micropost_id)): AppPath<(u64, u64)>,
) -> Result<Json<MessageResponse>, AppError> {
    match state.microposts.get(micropost_id).await? {
        Some(micropost) if micropost.user_id != user_id => {
            return Err(not_found(micropost_id).into());
        }
        Some(_) => {
            state.microposts.delete(micropost_id).await?;
            tracing::info!(micropost_id, user_id, "Deleted micropost");
        }
        None => {}
    }

    Ok(Json(MessageResponse::ok()))
}
