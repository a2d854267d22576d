//! Request extractors that reject with the API's error body.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use super::error::{AppError, MalformedRequest};

/// JSON body extractor. Malformed bodies and a missing content type become a
/// 400 with the decoder's message under `errors.body`.
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| MalformedRequest::new("body", rejection.body_text()))?;
        Ok(Self(payload))
    }
}

/// Path parameter extractor. Unparseable segments become a 400 with the
/// message under `errors.path`.
pub struct AppPath<T>(pub T);

impl<T, S> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| MalformedRequest::new("path", rejection.body_text()))?;
        Ok(Self(params))
    }
}
