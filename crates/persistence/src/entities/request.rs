//! Translation request entities.

use chrono::{DateTime, Utc};
use domain::models::{JobStatus, QuoteStatus, RequestStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the translation_requests table.
#[derive(Debug, Clone, FromRow)]
pub struct RequestEntity {
    pub id: Uuid,
    pub client_id: Uuid,
    pub source_language: String,
    pub target_language: String,
    pub original_filename: String,
    pub translated_filename: Option<String>,
    pub word_count: i32,
    pub source_text: String,
    pub extraction_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<RequestEntity> for domain::models::TranslationRequest {
    fn from(entity: RequestEntity) -> Self {
        Self {
            id: entity.id,
            client_id: entity.client_id,
            source_language: entity.source_language,
            target_language: entity.target_language,
            original_filename: entity.original_filename,
            translated_filename: entity.translated_filename,
            word_count: entity.word_count,
            source_text: entity.source_text,
            extraction_error: entity.extraction_error,
            created_at: entity.created_at,
        }
    }
}

/// A request joined with its client, quote and job for list views.
#[derive(Debug, Clone, FromRow)]
pub struct RequestSummaryEntity {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_handle: String,
    pub source_language: String,
    pub target_language: String,
    pub original_filename: String,
    pub word_count: i32,
    pub extraction_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub quote_id: Option<Uuid>,
    pub quote_status: Option<String>,
    pub quote_total: Option<Decimal>,
    pub quote_currency: Option<String>,
    pub job_id: Option<Uuid>,
    pub job_status: Option<String>,
}

/// API shape of [`RequestSummaryEntity`] with the derived status filled in.
#[derive(Debug, Clone, Serialize)]
pub struct RequestSummary {
    pub id: Uuid,
    pub client_id: Uuid,
    pub client_handle: String,
    pub source_language: String,
    pub target_language: String,
    pub original_filename: String,
    pub word_count: i32,
    pub needs_review: bool,
    pub status: RequestStatus,
    pub quote_id: Option<Uuid>,
    pub quote_status: Option<QuoteStatus>,
    pub quote_total: Option<Decimal>,
    pub quote_currency: Option<String>,
    pub job_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<RequestSummaryEntity> for RequestSummary {
    fn from(entity: RequestSummaryEntity) -> Self {
        let quote_status = entity
            .quote_status
            .as_deref()
            .and_then(|s| QuoteStatus::from_str(s).ok());
        let job_status = entity
            .job_status
            .as_deref()
            .and_then(|s| JobStatus::from_str(s).ok());

        Self {
            id: entity.id,
            client_id: entity.client_id,
            client_handle: entity.client_handle,
            source_language: entity.source_language,
            target_language: entity.target_language,
            original_filename: entity.original_filename,
            word_count: entity.word_count,
            needs_review: entity.extraction_error.is_some(),
            status: RequestStatus::derive(quote_status, job_status),
            quote_id: entity.quote_id,
            quote_status,
            quote_total: entity.quote_total,
            quote_currency: entity.quote_currency,
            job_id: entity.job_id,
            created_at: entity.created_at,
        }
    }
}
