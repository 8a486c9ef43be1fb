//! Audit log repository.
//!
//! Entries are written with the same connection as the change they describe,
//! so both commit or roll back together.

use domain::models::NewAuditEntry;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::AuditLogEntity;
use crate::metrics::QueryTimer;

pub const MAX_AUDIT_PAGE: i64 = 500;

#[derive(Clone)]
pub struct AuditLogRepository {
    pool: PgPool,
}

impl AuditLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one entry inside the caller's transaction.
    pub async fn record(conn: &mut PgConnection, entry: &NewAuditEntry) -> Result<Uuid, sqlx::Error> {
        let timer = QueryTimer::new("insert_audit_log");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO audit_logs (actor_id, action, object_type, object_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(entry.actor_id)
        .bind(entry.action.as_str())
        .bind(entry.object_type.as_str())
        .bind(entry.object_id)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Newest first.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<AuditLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_recent_audit_logs");
        let result = sqlx::query_as::<_, AuditLogEntity>(
            r#"
            SELECT a.id, a.actor_id, u.handle AS actor_handle, a.action, a.object_type,
                   a.object_id, a.created_at
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.actor_id
            ORDER BY a.created_at DESC, a.id
            LIMIT $1
            "#,
        )
        .bind(limit.clamp(1, MAX_AUDIT_PAGE))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Entries for one object, oldest first.
    pub async fn list_for_object(
        &self,
        object_type: &str,
        object_id: Uuid,
    ) -> Result<Vec<AuditLogEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_audit_logs_for_object");
        let result = sqlx::query_as::<_, AuditLogEntity>(
            r#"
            SELECT a.id, a.actor_id, u.handle AS actor_handle, a.action, a.object_type,
                   a.object_id, a.created_at
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.actor_id
            WHERE a.object_type = $1 AND a.object_id = $2
            ORDER BY a.created_at, a.id
            "#,
        )
        .bind(object_type)
        .bind(object_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
