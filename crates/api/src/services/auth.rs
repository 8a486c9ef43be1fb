//! Registration, login and account creation.

use domain::models::{AuditAction, NewAuditEntry, ObjectType, Role, User};
use persistence::repositories::{AuditLogRepository, UserRepository};
use shared::jwt::{JwtConfig, JwtError};
use shared::password::{hash_password, verify_password, PasswordError};
use shared::validation::{validate_handle, validate_password_strength};
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Handle already taken")]
    HandleTaken,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A user together with a fresh access token.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub user: User,
    pub access_token: String,
    pub expires_in: i64,
}

pub struct AuthService {
    pool: PgPool,
    jwt: Arc<JwtConfig>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtConfig>) -> Self {
        Self { pool, jwt }
    }

    /// Self-service registration; always creates a client.
    pub async fn register(&self, handle: &str, password: &str) -> Result<AuthResult, AuthError> {
        let user = self
            .create_user(None, handle, password, Role::Client, AuditAction::UserRegister)
            .await?;
        self.issue(user)
    }

    /// Account creation by an admin.
    pub async fn create_by_admin(
        &self,
        admin: &User,
        handle: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        self.create_user(Some(admin), handle, password, role, AuditAction::UserCreate)
            .await
    }

    pub async fn login(&self, handle: &str, password: &str) -> Result<AuthResult, AuthError> {
        let entity = UserRepository::new(self.pool.clone())
            .find_by_handle(handle.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &entity.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let user = User::from(entity);
        let mut tx = self.pool.begin().await?;
        AuditLogRepository::record(
            &mut tx,
            &NewAuditEntry::new(user.id, AuditAction::UserLogin, ObjectType::User).object(user.id),
        )
        .await?;
        tx.commit().await?;

        info!(user_id = %user.id, "User logged in");
        self.issue(user)
    }

    async fn create_user(
        &self,
        actor: Option<&User>,
        handle: &str,
        password: &str,
        role: Role,
        action: AuditAction,
    ) -> Result<User, AuthError> {
        let handle = handle.trim();
        validate_handle(handle).map_err(|e| AuthError::InvalidInput(message(&e)))?;
        validate_password_strength(password).map_err(|e| AuthError::InvalidInput(message(&e)))?;

        let password_hash = hash_password(password)?;

        let mut tx = self.pool.begin().await?;
        if UserRepository::handle_exists(&mut tx, handle).await? {
            return Err(AuthError::HandleTaken);
        }
        let user = User::from(UserRepository::create(&mut tx, handle, &password_hash, role.as_str()).await?);
        let actor_id = actor.map(|a| a.id).unwrap_or(user.id);
        AuditLogRepository::record(
            &mut tx,
            &NewAuditEntry::new(actor_id, action, ObjectType::User).object(user.id),
        )
        .await?;
        tx.commit().await?;

        info!(user_id = %user.id, handle = %user.handle, role = %user.role, "User created");
        Ok(user)
    }

    fn issue(&self, user: User) -> Result<AuthResult, AuthError> {
        let (access_token, _jti) = self
            .jwt
            .generate_access_token(user.id, user.role.as_str())?;
        Ok(AuthResult {
            user,
            access_token,
            expires_in: self.jwt.access_token_expiry_secs,
        })
    }
}

fn message(error: &validator::ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}
