use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::security::{self, Principal};
use crate::core::state::AppState;
use crate::db::types::UserRole;

pub(crate) struct CurrentUser(pub(crate) Principal);
pub(crate) struct CurrentStudent(pub(crate) Principal);
pub(crate) struct CurrentInstructor(pub(crate) Principal);
/// An instructor the identity provider has marked as verified; required for authoring.
pub(crate) struct VerifiedInstructor(pub(crate) Principal);
pub(crate) struct CurrentAdmin(pub(crate) Principal);
/// The caller's principal when a valid token is present; anonymous otherwise.
pub(crate) struct OptionalUser(pub(crate) Option<Principal>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let token = bearer_token(parts)
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let principal = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        Ok(CurrentUser(principal))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if bearer_token(parts).is_none() {
            return Ok(OptionalUser(None));
        }
        let CurrentUser(principal) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(OptionalUser(Some(principal)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentStudent {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = require_role(parts, state, UserRole::Student, "Student access required").await?;
        Ok(CurrentStudent(principal))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentInstructor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal =
            require_role(parts, state, UserRole::Instructor, "Instructor access required").await?;
        Ok(CurrentInstructor(principal))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for VerifiedInstructor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentInstructor(principal) = CurrentInstructor::from_request_parts(parts, state).await?;

        if principal.instructor_verified {
            Ok(VerifiedInstructor(principal))
        } else {
            Err(ApiError::Forbidden("Instructor verification required"))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = require_role(parts, state, UserRole::Admin, "Admin access required").await?;
        Ok(CurrentAdmin(principal))
    }
}

async fn require_role(
    parts: &mut Parts,
    state: &AppState,
    role: UserRole,
    message: &'static str,
) -> Result<Principal, ApiError> {
    let CurrentUser(principal) = CurrentUser::from_request_parts(parts, state).await?;
    if principal.role == role {
        Ok(principal)
    } else {
        Err(ApiError::Forbidden(message))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}
