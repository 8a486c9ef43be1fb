//! Audit log entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// An audit_logs row joined with the actor's handle.
#[derive(Debug, Clone, FromRow)]
pub struct AuditLogEntity {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub actor_handle: Option<String>,
    pub action: String,
    pub object_type: String,
    pub object_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<AuditLogEntity> for domain::models::AuditLogEntry {
    fn from(entity: AuditLogEntity) -> Self {
        Self {
            id: entity.id,
            actor_id: entity.actor_id,
            actor_handle: entity.actor_handle,
            action: entity.action,
            object_type: entity.object_type,
            object_id: entity.object_id,
            created_at: entity.created_at,
        }
    }
}
