//! Bearer token authentication.
//!
//! The token identifies the user; the user row is re-loaded on every request
//! and its stored role is what gets authorized.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::models::User;
use persistence::repositories::UserRepository;
use shared::jwt::extract_bearer_token;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl std::ops::Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

/// Resolves a raw token to a stored user.
///
/// Shared by the header extractor and the live-channel handshake, which
/// receives its token in the query string.
pub async fn authenticate(state: &AppState, token: &str) -> Result<User, ApiError> {
    let claims = state
        .jwt
        .validate_token(token)
        .map_err(|_| ApiError::Unauthorized("Invalid or expired token".to_string()))?;
    let user_id = claims
        .user_id()
        .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

    UserRepository::new(state.pool.clone())
        .find_by_id(user_id)
        .await?
        .map(User::from)
        .ok_or_else(|| ApiError::Unauthorized("User no longer exists".to_string()))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = extract_bearer_token(header).ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let user = CurrentUser(authenticate(state, token).await?);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
