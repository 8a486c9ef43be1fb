//! Quote entity.

use chrono::{DateTime, Utc};
use domain::models::QuoteStatus;
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Database row mapping for the quotes table.
#[derive(Debug, Clone, FromRow)]
pub struct QuoteEntity {
    pub id: Uuid,
    pub request_id: Uuid,
    pub word_count: i32,
    pub unit_price: Decimal,
    pub currency: String,
    pub total: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<QuoteEntity> for domain::models::Quote {
    fn from(entity: QuoteEntity) -> Self {
        Self {
            id: entity.id,
            request_id: entity.request_id,
            word_count: entity.word_count,
            unit_price: entity.unit_price,
            currency: entity.currency,
            total: entity.total,
            status: QuoteStatus::from_str(&entity.status).unwrap_or(QuoteStatus::Draft),
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
