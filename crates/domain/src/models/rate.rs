//! Rate table entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-word price for a language pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub id: Uuid,
    pub source_language: String,
    pub target_language: String,
    pub unit_price: Decimal,
    pub currency: String,
}
