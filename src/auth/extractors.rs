use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::{error, warn};

use super::jwt::JwtKeys;
use crate::{error::AppError, state::AppState, users::repo_types::User};

/// Resolves the bearer token to the calling user.
///
/// Every failure, from a missing header to a token for a deleted account,
/// collapses into [`AppError::Unauthenticated`].
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .map(str::trim)
            .ok_or(AppError::Unauthenticated)?;

        let email = JwtKeys::from_ref(state).verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            AppError::Unauthenticated
        })?;

        let user = state
            .store
            .find_user_by_email(&email)
            .await
            .map_err(|e| {
                error!(error = %e, "load user for token failed");
                AppError::Internal(e)
            })?
            .ok_or_else(|| {
                warn!(email = %email, "token subject has no account");
                AppError::Unauthenticated
            })?;

        Ok(AuthUser(user))
    }
}

/// Like [`AuthUser`], but a request without an `Authorization` header is anonymous.
///
/// A header that is present must still verify.
pub struct MaybeAuthUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(MaybeAuthUser(None));
        }
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        Ok(MaybeAuthUser(Some(user)))
    }
}
