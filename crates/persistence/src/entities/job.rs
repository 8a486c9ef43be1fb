//! Job entities.

use chrono::{DateTime, Utc};
use domain::models::JobStatus;
use serde::Serialize;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// A jobs row joined with the owning request's client.
#[derive(Debug, Clone, FromRow)]
pub struct JobEntity {
    pub id: Uuid,
    pub request_id: Uuid,
    pub client_id: Uuid,
    pub translator_id: Option<Uuid>,
    pub status: String,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub manager_comment: Option<String>,
    pub delivered_filename: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub translated_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobEntity> for domain::models::Job {
    fn from(entity: JobEntity) -> Self {
        Self {
            id: entity.id,
            request_id: entity.request_id,
            client_id: entity.client_id,
            translator_id: entity.translator_id,
            status: JobStatus::from_str(&entity.status).unwrap_or(JobStatus::New),
            due_date: entity.due_date,
            notes: entity.notes,
            manager_comment: entity.manager_comment,
            delivered_filename: entity.delivered_filename,
            delivered_at: entity.delivered_at,
            translated_text: entity.translated_text,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Job row for list views and dashboards.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobSummaryEntity {
    pub id: Uuid,
    pub request_id: Uuid,
    pub status: String,
    pub source_language: String,
    pub target_language: String,
    pub original_filename: String,
    pub word_count: i32,
    pub client_handle: String,
    pub translator_id: Option<Uuid>,
    pub translator_handle: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
