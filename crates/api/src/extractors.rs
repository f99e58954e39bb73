//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use polity_common::AppError;
use polity_core::TriggerPrincipal;

/// The caller that passed trigger authorization.
#[derive(Debug, Clone)]
pub struct Trigger(pub TriggerPrincipal);

impl<S> FromRequestParts<S> for Trigger
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the trigger auth middleware
        parts
            .extensions
            .get::<TriggerPrincipal>()
            .cloned()
            .map(Trigger)
            .ok_or(AppError::Unauthorized)
    }
}
