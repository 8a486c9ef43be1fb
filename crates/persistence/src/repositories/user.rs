//! User repository for database operations.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::UserEntity;
use crate::metrics::QueryTimer;

/// Repository for user-related database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, handle, password_hash, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by handle.
    pub async fn find_by_handle(&self, handle: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_handle");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, handle, password_hash, role, created_at
            FROM users
            WHERE handle = $1
            "#,
        )
        .bind(handle)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List users holding a role, ordered by handle.
    pub async fn list_by_role(&self, role: &str) -> Result<Vec<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_users_by_role");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, handle, password_hash, role, created_at
            FROM users
            WHERE role = $1
            ORDER BY handle
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Handles of every manager and admin, used as notification recipients.
    pub async fn staff_handles(&self) -> Result<Vec<String>, sqlx::Error> {
        let timer = QueryTimer::new("list_staff_handles");
        let result = sqlx::query_scalar::<_, String>(
            r#"
            SELECT handle
            FROM users
            WHERE role IN ('manager', 'admin')
            ORDER BY handle
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Insert a user inside the caller's transaction.
    pub async fn create(
        conn: &mut PgConnection,
        handle: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_user");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (handle, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, handle, password_hash, role, created_at
            "#,
        )
        .bind(handle)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Check for a handle inside the caller's transaction.
    pub async fn handle_exists(conn: &mut PgConnection, handle: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("user_handle_exists");
        let result =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE handle = $1)")
                .bind(handle)
                .fetch_one(&mut *conn)
                .await;
        timer.record();
        result
    }
}
