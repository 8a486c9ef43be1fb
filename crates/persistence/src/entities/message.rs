//! Message entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A messages row joined with its author's handle.
#[derive(Debug, Clone, FromRow)]
pub struct MessageEntity {
    pub id: Uuid,
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub author_handle: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<MessageEntity> for domain::models::Message {
    fn from(entity: MessageEntity) -> Self {
        Self {
            id: entity.id,
            job_id: entity.job_id,
            user_id: entity.user_id,
            author_handle: entity.author_handle,
            text: entity.text,
            created_at: entity.created_at,
        }
    }
}
