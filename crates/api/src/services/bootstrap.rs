//! Startup creation of configured staff and translator accounts.
//!
//! Idempotent: handles that already exist are left untouched.

use domain::models::{AuditAction, NewAuditEntry, ObjectType};
use persistence::repositories::{AuditLogRepository, UserRepository};
use shared::password::{generate_password, hash_password, PasswordError};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::config::BootstrapConfig;

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),
}

/// Creates missing bootstrap users. Returns the handles that were created.
pub async fn bootstrap_users(
    pool: &PgPool,
    config: &BootstrapConfig,
) -> Result<Vec<String>, BootstrapError> {
    let mut created = Vec::new();

    for entry in &config.users {
        let mut tx = pool.begin().await?;
        if UserRepository::handle_exists(&mut tx, &entry.handle).await? {
            continue;
        }

        let generated = entry.password.is_empty();
        let password = if generated {
            generate_password()
        } else {
            entry.password.clone()
        };
        let password_hash = hash_password(&password)?;

        let user =
            UserRepository::create(&mut tx, &entry.handle, &password_hash, entry.role.as_str())
                .await?;
        AuditLogRepository::record(
            &mut tx,
            &NewAuditEntry::system(AuditAction::UserCreate, ObjectType::User).object(user.id),
        )
        .await?;
        tx.commit().await?;

        info!(handle = %entry.handle, role = %entry.role, user_id = %user.id, "Bootstrap user created");
        if generated {
            warn!(
                handle = %entry.handle,
                "Generated password for bootstrap user: {}. It is not shown again.",
                password
            );
        }
        created.push(entry.handle.clone());
    }

    Ok(created)
}
