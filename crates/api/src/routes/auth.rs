//! Registration and login.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::User;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::auth::{AuthError, AuthResult, AuthService};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, max = 150, message = "Handle must be 1-150 characters"))]
    pub handle: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub user: User,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<AuthResult> for TokenResponse {
    fn from(result: AuthResult) -> Self {
        Self {
            user: result.user,
            access_token: result.access_token,
            token_type: "Bearer".to_string(),
            expires_in: result.expires_in,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::HandleTaken => ApiError::Conflict("Handle already taken".to_string()),
            AuthError::InvalidInput(msg) => ApiError::Validation(msg),
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid handle or password".to_string())
            }
            AuthError::Database(e) => ApiError::from(e),
            AuthError::Token(e) => ApiError::Internal(format!("Token error: {}", e)),
            AuthError::Password(e) => ApiError::Internal(format!("Password error: {}", e)),
        }
    }
}

/// POST /api/v1/auth/register
///
/// Always creates a client account.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    request.validate()?;

    let result = AuthService::new(state.pool.clone(), state.jwt.clone())
        .register(&request.handle, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(result.into())))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    request.validate()?;

    let result = AuthService::new(state.pool.clone(), state.jwt.clone())
        .login(&request.handle, &request.password)
        .await?;

    Ok(Json(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_validation() {
        let ok = CredentialsRequest {
            handle: "alice".into(),
            password: "Secret123".into(),
        };
        assert!(ok.validate().is_ok());

        let empty = CredentialsRequest {
            handle: "".into(),
            password: "".into(),
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_auth_error_mapping() {
        assert!(matches!(ApiError::from(AuthError::HandleTaken), ApiError::Conflict(_)));
        assert!(matches!(
            ApiError::from(AuthError::InvalidCredentials),
            ApiError::Unauthorized(_)
        ));
        assert!(matches!(
            ApiError::from(AuthError::InvalidInput("bad".into())),
            ApiError::Validation(m) if m == "bad"
        ));
    }
}
