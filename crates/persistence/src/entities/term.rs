//! Glossary term entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct TermEntity {
    pub id: Uuid,
    pub client_id: Uuid,
    pub source_term: String,
    pub target_term: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<TermEntity> for domain::models::Term {
    fn from(entity: TermEntity) -> Self {
        Self {
            id: entity.id,
            client_id: entity.client_id,
            source_term: entity.source_term,
            target_term: entity.target_term,
            notes: entity.notes,
            created_at: entity.created_at,
        }
    }
}
