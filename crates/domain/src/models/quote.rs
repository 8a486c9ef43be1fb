//! Quote domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Quote status. Approved and Rejected are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteStatus {
    Draft,
    Sent,
    Approved,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "Draft",
            QuoteStatus::Sent => "Sent",
            QuoteStatus::Approved => "Approved",
            QuoteStatus::Rejected => "Rejected",
        }
    }

    /// Price changes are allowed until the client has answered.
    pub fn is_repriceable(&self) -> bool {
        matches!(self, QuoteStatus::Draft | QuoteStatus::Sent)
    }
}

impl FromStr for QuoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(QuoteStatus::Draft),
            "Sent" => Ok(QuoteStatus::Sent),
            "Approved" => Ok(QuoteStatus::Approved),
            "Rejected" => Ok(QuoteStatus::Rejected),
            _ => Err(format!("Unknown quote status: {}", s)),
        }
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A priced offer for one request.
///
/// `total` always equals `word_count * unit_price` rounded to cents; use
/// [`crate::services::pricing`] to build or change one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub request_id: Uuid,
    pub word_count: i32,
    pub unit_price: Decimal,
    pub currency: String,
    pub total: Decimal,
    pub status: QuoteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// Unconditional setter. Which actor may request which status is decided by
    /// `QuoteStateMachine`.
    pub fn set_status(&mut self, status: QuoteStatus) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            QuoteStatus::Draft,
            QuoteStatus::Sent,
            QuoteStatus::Approved,
            QuoteStatus::Rejected,
        ] {
            assert_eq!(status.as_str().parse::<QuoteStatus>().unwrap(), status);
        }
        assert!("draft".parse::<QuoteStatus>().is_err());
    }

    #[test]
    fn test_repriceable() {
        assert!(QuoteStatus::Draft.is_repriceable());
        assert!(QuoteStatus::Sent.is_repriceable());
        assert!(!QuoteStatus::Approved.is_repriceable());
        assert!(!QuoteStatus::Rejected.is_repriceable());
    }
}
