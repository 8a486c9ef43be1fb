//! Invoice generation and retrieval.
//!
//! Generation is split in two transactions around the render: the draft and
//! its audit entry commit first, the render runs without holding locks, and
//! a second transaction flips the draft to issued. A failed render leaves the
//! draft in place so the next request retries it.

use chrono::Utc;
use domain::models::{
    AuditAction, Capability, Invoice, InvoiceOutcome, Job, NewAuditEntry, ObjectType, Quote,
    Role, TranslationRequest, User,
};
use domain::services::{
    invoice_amount, plan_invoice, require, InvoiceDocument, InvoicePlan, InvoiceRenderer,
};
use domain::DomainError;
use persistence::repositories::{
    AuditLogRepository, InvoiceRepository, JobRepository, QuoteRepository, RequestRepository,
    UserRepository,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::storage::{display_name, FileStorage};
use crate::app::AppState;
use crate::error::ApiError;

pub struct InvoiceService {
    pool: PgPool,
    renderer: Arc<dyn InvoiceRenderer>,
    storage: FileStorage,
}

impl InvoiceService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            renderer: state.renderer.clone(),
            storage: state.storage.clone(),
        }
    }

    /// Issues the job's invoice, or reports the one issued before.
    pub async fn generate(&self, staff: &User, job_id: Uuid) -> Result<InvoiceOutcome, ApiError> {
        require(staff, Capability::IssueInvoices)?;

        let mut tx = self.pool.begin().await?;
        let job: Job = JobRepository::lock(&mut tx, job_id)
            .await?
            .ok_or(DomainError::NotFound("Job"))?
            .into();
        let existing = InvoiceRepository::lock_by_job(&mut tx, job.id)
            .await?
            .map(Invoice::from);

        let draft = match plan_invoice(&job, existing)? {
            InvoicePlan::AlreadyIssued(invoice) => {
                tx.commit().await?;
                return Ok(InvoiceOutcome::AlreadyInvoiced(invoice));
            }
            InvoicePlan::RetryRender(invoice) => {
                info!(invoice_id = %invoice.id, "Retrying render of draft invoice");
                invoice
            }
            InvoicePlan::Create => {
                let quote = QuoteRepository::new(self.pool.clone())
                    .find_by_request(job.request_id)
                    .await?
                    .map(Quote::from);
                let (amount, currency) = invoice_amount(quote.as_ref());
                let invoice: Invoice =
                    InvoiceRepository::create_draft(&mut tx, job.client_id, job.id, amount, &currency)
                        .await?
                        .ok_or_else(|| DomainError::conflict("Invoice is being generated"))?
                        .into();
                AuditLogRepository::record(
                    &mut tx,
                    &NewAuditEntry::new(staff.id, AuditAction::InvoiceCreate, ObjectType::Invoice)
                        .object(invoice.id),
                )
                .await?;
                invoice
            }
        };
        tx.commit().await?;

        let document = self.document(&draft, &job).await?;
        let file_path = match self.renderer.render(&document).await {
            Ok(path) => path,
            Err(e) => {
                warn!(invoice_id = %draft.id, error = %e, "Invoice render failed");
                return Err(ApiError::ServiceUnavailable(
                    "Invoice could not be rendered; try again later".to_string(),
                ));
            }
        };

        let mut tx = self.pool.begin().await?;
        let issued = InvoiceRepository::mark_issued(&mut tx, draft.id, &file_path, document.issued_on).await?;
        let Some(issued) = issued else {
            // Someone else issued it while we rendered.
            tx.commit().await?;
            let invoice: Invoice = InvoiceRepository::new(self.pool.clone())
                .find_by_id(draft.id)
                .await?
                .ok_or(DomainError::NotFound("Invoice"))?
                .into();
            return Ok(InvoiceOutcome::AlreadyInvoiced(invoice));
        };
        AuditLogRepository::record(
            &mut tx,
            &NewAuditEntry::new(staff.id, AuditAction::InvoiceIssue, ObjectType::Invoice)
                .object(issued.id),
        )
        .await?;
        tx.commit().await?;

        let invoice: Invoice = issued.into();
        info!(
            invoice_id = %invoice.id,
            number = invoice.number,
            job_id = %job.id,
            actor = %staff.id,
            "Invoice issued"
        );
        Ok(InvoiceOutcome::Issued(invoice))
    }

    /// Staff see every invoice, clients their own.
    pub async fn list(&self, user: &User) -> Result<Vec<Invoice>, ApiError> {
        let client_filter = match user.role {
            Role::Manager | Role::Admin => None,
            Role::Client => Some(user.id),
            Role::Translator => return Err(DomainError::forbidden("Translators have no invoices").into()),
        };
        Ok(InvoiceRepository::new(self.pool.clone())
            .list(client_filter)
            .await?
            .into_iter()
            .map(Invoice::from)
            .collect())
    }

    /// The rendered invoice file as `(display name, bytes)`.
    pub async fn download(&self, user: &User, invoice_id: Uuid) -> Result<(String, Vec<u8>), ApiError> {
        let invoice: Invoice = InvoiceRepository::new(self.pool.clone())
            .find_by_id(invoice_id)
            .await?
            .ok_or(DomainError::NotFound("Invoice"))?
            .into();
        if !may_see(user, &invoice) {
            return Err(DomainError::forbidden("Not your invoice").into());
        }
        let path = invoice
            .file_path
            .ok_or_else(|| DomainError::conflict("Invoice has not been issued yet"))?;
        let bytes = self
            .storage
            .read(&path)
            .await?;
        Ok((display_name(&path).to_string(), bytes))
    }

    async fn document(&self, invoice: &Invoice, job: &Job) -> Result<InvoiceDocument, ApiError> {
        let request: TranslationRequest = RequestRepository::new(self.pool.clone())
            .find_by_id(job.request_id)
            .await?
            .ok_or(DomainError::NotFound("Request"))?
            .into();
        let client_handle = UserRepository::new(self.pool.clone())
            .find_by_id(invoice.client_id)
            .await?
            .map(|u| u.handle)
            .unwrap_or_default();
        let quote = QuoteRepository::new(self.pool.clone())
            .find_by_request(job.request_id)
            .await?
            .map(Quote::from);

        Ok(InvoiceDocument {
            invoice_id: invoice.id,
            number: invoice.number,
            issued_on: Utc::now(),
            client_handle,
            job_id: job.id,
            source_language: request.source_language,
            target_language: request.target_language,
            word_count: quote.as_ref().map_or(request.word_count, |q| q.word_count),
            unit_price: quote.as_ref().map_or(Decimal::ZERO, |q| q.unit_price),
            amount: invoice.amount,
            currency: invoice.currency.clone(),
        })
    }
}

fn may_see(user: &User, invoice: &Invoice) -> bool {
    user.role.is_staff() || (user.role == Role::Client && invoice.client_id == user.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::InvoiceStatus;

    fn user(role: Role) -> User {
        User {
            id: Uuid::new_v4(),
            handle: "u".into(),
            role,
            created_at: Utc::now(),
        }
    }

    fn invoice_for(client_id: Uuid) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            number: 7,
            client_id,
            job_id: Uuid::new_v4(),
            amount: Decimal::new(10000, 2),
            currency: "EUR".into(),
            status: InvoiceStatus::Issued,
            issued_at: Some(Utc::now()),
            file_path: Some("invoices/invoice_7.txt".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoice_visibility() {
        let client = user(Role::Client);
        let invoice = invoice_for(client.id);

        assert!(may_see(&client, &invoice));
        assert!(may_see(&user(Role::Manager), &invoice));
        assert!(may_see(&user(Role::Admin), &invoice));
        assert!(!may_see(&user(Role::Client), &invoice));
        assert!(!may_see(&user(Role::Translator), &invoice));
    }
}
