//! Account administration.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::{Capability, Role, User};
use domain::services::require;
use persistence::repositories::UserRepository;
use serde::Deserialize;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::AuthService;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 150))]
    pub handle: String,
    #[validate(length(min = 1))]
    pub password: String,
    pub role: Role,
}

/// POST /api/v1/users (admin)
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(admin): CurrentUser,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    require(&admin, Capability::ManageUsers)?;
    request.validate()?;

    let user = AuthService::new(state.pool.clone(), state.jwt.clone())
        .create_by_admin(&admin, &request.handle, &request.password, request.role)
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// GET /api/v1/users/translators (staff)
pub async fn list_translators(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<User>>, ApiError> {
    if !user.role.is_staff() {
        return Err(ApiError::Forbidden("Staff only".to_string()));
    }
    let translators = UserRepository::new(state.pool.clone())
        .list_by_role(Role::Translator.as_str())
        .await?
        .into_iter()
        .map(User::from)
        .collect();
    Ok(Json(translators))
}
