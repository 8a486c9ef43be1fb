//! Invoice planning and the rendering seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::pricing::DEFAULT_CURRENCY;
use crate::models::{Invoice, InvoiceStatus, Job, Quote};
use crate::DomainError;

/// What generating an invoice for a job has to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvoicePlan {
    /// Issued before; report it and change nothing.
    AlreadyIssued(Invoice),
    /// A previous render failed; render the existing draft again.
    RetryRender(Invoice),
    Create,
}

pub fn plan_invoice(job: &Job, existing: Option<Invoice>) -> Result<InvoicePlan, DomainError> {
    if let Some(invoice) = existing {
        return Ok(match invoice.status {
            InvoiceStatus::Issued => InvoicePlan::AlreadyIssued(invoice),
            InvoiceStatus::Draft => InvoicePlan::RetryRender(invoice),
        });
    }
    if !job.status.is_invoiceable() {
        return Err(DomainError::conflict(format!(
            "Job is {}; only delivered or accepted jobs can be invoiced",
            job.status
        )));
    }
    Ok(InvoicePlan::Create)
}

/// Amount and currency snapshot taken from the quote at generation time.
pub fn invoice_amount(quote: Option<&Quote>) -> (Decimal, String) {
    match quote {
        Some(q) => (q.total, q.currency.clone()),
        None => (Decimal::ZERO, DEFAULT_CURRENCY.to_string()),
    }
}

/// Everything a renderer needs to lay out one invoice.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceDocument {
    pub invoice_id: Uuid,
    pub number: i64,
    pub issued_on: DateTime<Utc>,
    pub client_handle: String,
    pub job_id: Uuid,
    pub source_language: String,
    pub target_language: String,
    pub word_count: i32,
    pub unit_price: Decimal,
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invoice file could not be written: {0}")]
    Io(String),

    #[error("Invoice layout failed: {0}")]
    Layout(String),
}

#[async_trait]
pub trait InvoiceRenderer: Send + Sync {
    /// Returns a reference to the rendered file.
    async fn render(&self, document: &InvoiceDocument) -> Result<String, RenderError>;
}
