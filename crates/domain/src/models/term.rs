//! Client glossary terms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: Uuid,
    pub client_id: Uuid,
    pub source_term: String,
    pub target_term: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request payload for adding a glossary term.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTermRequest {
    pub client_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub source_term: String,
    #[validate(length(min = 1, max = 255))]
    pub target_term: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
