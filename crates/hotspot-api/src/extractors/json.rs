//! JSON body extractor that runs `validator` rules.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use hotspot_core::error::AppError;

use crate::error::ApiError;

/// Like [`Json`], but rejects malformed or invalid bodies with a
/// `400 INVALID_REQUEST` error body.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::invalid_request(rejection.body_text()))?;
        value
            .validate()
            .map_err(|e| AppError::invalid_request(e.to_string()))?;
        Ok(Self(value))
    }
}
