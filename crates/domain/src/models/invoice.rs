//! Invoice domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Created but not yet rendered.
    Draft,
    Issued,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Issued => "Issued",
        }
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Draft" => Ok(InvoiceStatus::Draft),
            "Issued" => Ok(InvoiceStatus::Issued),
            _ => Err(format!("Unknown invoice status: {}", s)),
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At most one invoice exists per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub number: i64,
    pub client_id: Uuid,
    pub job_id: Uuid,
    pub amount: Decimal,
    pub currency: String,
    pub status: InvoiceStatus,
    pub issued_at: Option<DateTime<Utc>>,
    pub file_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn issue(&mut self, file_path: String, now: DateTime<Utc>) {
        self.status = InvoiceStatus::Issued;
        self.issued_at = Some(now);
        self.file_path = Some(file_path);
    }
}

/// Result of asking for a job's invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoiceOutcome {
    Issued(Invoice),
    /// The job was invoiced before; nothing changed.
    AlreadyInvoiced(Invoice),
}

impl InvoiceOutcome {
    pub fn invoice(&self) -> &Invoice {
        match self {
            InvoiceOutcome::Issued(i) | InvoiceOutcome::AlreadyInvoiced(i) => i,
        }
    }
}
