//! Rate entity.

use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct RateEntity {
    pub id: Uuid,
    pub source_language: String,
    pub target_language: String,
    pub unit_price: Decimal,
    pub currency: String,
}

impl From<RateEntity> for domain::models::Rate {
    fn from(entity: RateEntity) -> Self {
        Self {
            id: entity.id,
            source_language: entity.source_language,
            target_language: entity.target_language,
            unit_price: entity.unit_price,
            currency: entity.currency,
        }
    }
}
