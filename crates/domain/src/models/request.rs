//! Translation request domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{JobStatus, QuoteStatus};

/// A client's submitted source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRequest {
    pub id: Uuid,
    pub client_id: Uuid,
    pub source_language: String,
    pub target_language: String,
    pub original_filename: String,
    pub translated_filename: Option<String>,
    pub word_count: i32,
    #[serde(skip_serializing)]
    pub source_text: String,
    /// Set when text extraction failed and the request was kept for manual follow-up.
    pub extraction_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a request as seen by users.
///
/// Never stored: it is computed from the quote and job so the two can not drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    New,
    Quoted,
    Assigned,
    InProgress,
    Delivered,
    Accepted,
}

impl RequestStatus {
    /// The job owns the lifecycle once it exists; before that the quote decides.
    pub fn derive(quote: Option<QuoteStatus>, job: Option<JobStatus>) -> Self {
        match (job, quote) {
            (Some(job), _) => job.into(),
            (None, Some(QuoteStatus::Sent | QuoteStatus::Approved | QuoteStatus::Rejected)) => {
                RequestStatus::Quoted
            }
            (None, _) => RequestStatus::New,
        }
    }
}

impl From<JobStatus> for RequestStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::New => RequestStatus::New,
            JobStatus::Assigned => RequestStatus::Assigned,
            JobStatus::InProgress => RequestStatus::InProgress,
            JobStatus::Delivered => RequestStatus::Delivered,
            JobStatus::Accepted => RequestStatus::Accepted,
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RequestStatus::New => "New",
            RequestStatus::Quoted => "Quoted",
            RequestStatus::Assigned => "Assigned",
            RequestStatus::InProgress => "InProgress",
            RequestStatus::Delivered => "Delivered",
            RequestStatus::Accepted => "Accepted",
        };
        f.write_str(s)
    }
}

/// Fields needed to store a new request.
#[derive(Debug, Clone)]
pub struct NewTranslationRequest {
    pub client_id: Uuid,
    pub source_language: String,
    pub target_language: String,
    pub original_filename: String,
    pub word_count: i32,
    pub source_text: String,
    pub extraction_error: Option<String>,
}
