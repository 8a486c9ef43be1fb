//! Invoice entity.

use chrono::{DateTime, Utc};
use domain::models::InvoiceStatus;
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct InvoiceEntity {
    pub id: Uuid,
    pub number: i64,
    pub client_id: Uuid,
    pub job_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<InvoiceEntity> for domain::models::Invoice {
    fn from(entity: InvoiceEntity) -> Self {
        Self {
            id: entity.id,
            number: entity.number,
            client_id: entity.client_id,
            job_id: entity.job_id,
            amount: entity.amount,
            currency: entity.currency,
            status: InvoiceStatus::from_str(&entity.status).unwrap_or(InvoiceStatus::Draft),
            issued_at: entity.issued_at,
            file_path: entity.file_path,
            created_at: entity.created_at,
        }
    }
}
