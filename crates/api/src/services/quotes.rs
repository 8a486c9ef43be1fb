//! Quote operations: repricing, sending and the client's decision.

use chrono::Utc;
use domain::models::{
    AuditAction, Capability, Job, NewAuditEntry, ObjectType, Quote, QuoteStatus, Rate,
    TranslationRequest, User,
};
use domain::services::{
    can_view_request, price, require, NotificationTemplate, Notification, Notifier, PriceInput,
    QuoteStateMachine,
};
use domain::DomainError;
use persistence::repositories::{
    AuditLogRepository, JobRepository, QuoteRepository, RateRepository, RequestRepository,
    UserRepository,
};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::notifications::dispatch;
use crate::app::AppState;
use crate::error::ApiError;

/// Manager correction of a quote.
#[derive(Debug, Clone, Default)]
pub struct Reprice {
    pub unit_price: Option<Decimal>,
    pub word_count: Option<i32>,
    pub currency: Option<String>,
}

/// Result of approving a quote.
#[derive(Debug, Clone)]
pub struct Approval {
    pub quote: Quote,
    pub job: Job,
    /// False when the quote had already been approved.
    pub newly_approved: bool,
}

pub struct QuoteService {
    pool: PgPool,
    notifier: Arc<dyn Notifier>,
}

impl QuoteService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            notifier: state.notifier.clone(),
        }
    }

    /// The quote with its request, if `user` may see it.
    pub async fn get(&self, user: &User, quote_id: Uuid) -> Result<(Quote, TranslationRequest), ApiError> {
        let quote: Quote = QuoteRepository::new(self.pool.clone())
            .find_by_id(quote_id)
            .await?
            .ok_or(DomainError::NotFound("Quote"))?
            .into();
        let request: TranslationRequest = RequestRepository::new(self.pool.clone())
            .find_by_id(quote.request_id)
            .await?
            .ok_or(DomainError::NotFound("Request"))?
            .into();

        if !can_view_request(user, &request) {
            return Err(DomainError::forbidden("You do not have access to this quote").into());
        }
        Ok((quote, request))
    }

    /// Recomputes a Draft or Sent quote in place; its status is kept.
    pub async fn reprice(&self, manager: &User, quote_id: Uuid, input: Reprice) -> Result<Quote, ApiError> {
        require(manager, Capability::ManageQuotes)?;

        let mut tx = self.pool.begin().await?;
        let (quote, mut request) = lock_quote(&mut tx, quote_id).await?;

        let rate: Option<Rate> = RateRepository::find_for_pair(
            &mut tx,
            &request.source_language,
            &request.target_language,
        )
        .await?
        .map(Into::into);

        let word_count = input.word_count.unwrap_or(quote.word_count);
        let quote = price(
            &mut request,
            Some(quote),
            rate.as_ref(),
            PriceInput {
                word_count,
                override_unit_price: input.unit_price,
                currency: input.currency,
            },
            Utc::now(),
        )?;

        let quote: Quote = QuoteRepository::save(&mut tx, &quote).await?.into();
        RequestRepository::set_word_count(&mut tx, request.id, request.word_count).await?;
        AuditLogRepository::record(
            &mut tx,
            &NewAuditEntry::new(manager.id, AuditAction::QuoteUpdate, ObjectType::Quote).object(quote.id),
        )
        .await?;
        tx.commit().await?;

        info!(quote_id = %quote.id, actor = %manager.id, total = %quote.total, "Quote repriced");
        Ok(quote)
    }

    /// Draft or Sent -> Sent, then tells the client.
    pub async fn send(&self, manager: &User, quote_id: Uuid) -> Result<Quote, ApiError> {
        require(manager, Capability::ManageQuotes)?;

        let mut tx = self.pool.begin().await?;
        let (mut quote, request) = lock_quote(&mut tx, quote_id).await?;

        QuoteStateMachine::authorize(quote.status, QuoteStatus::Sent, manager.role)?;
        quote.set_status(QuoteStatus::Sent);
        quote.updated_at = Utc::now();

        let quote: Quote = QuoteRepository::save(&mut tx, &quote).await?.into();
        AuditLogRepository::record(
            &mut tx,
            &NewAuditEntry::new(manager.id, AuditAction::QuoteSend, ObjectType::Quote).object(quote.id),
        )
        .await?;
        tx.commit().await?;

        info!(quote_id = %quote.id, actor = %manager.id, "Quote sent");

        let client = self.handle_of(request.client_id).await?;
        dispatch(
            self.notifier.clone(),
            Notification::new(
                "Your quote is ready",
                client.into_iter().collect(),
                NotificationTemplate::QuoteSent,
                json!({
                    "quote_id": quote.id,
                    "file_name": request.original_filename,
                    "total": quote.total.to_string(),
                    "currency": quote.currency,
                    "word_count": quote.word_count,
                }),
            ),
        );
        Ok(quote)
    }

    /// Sent -> Approved plus the request's job, atomically.
    ///
    /// Approving an approved quote returns the existing job and writes nothing.
    pub async fn approve(&self, client: &User, quote_id: Uuid) -> Result<Approval, ApiError> {
        require(client, Capability::RespondToQuote)?;

        let mut tx = self.pool.begin().await?;
        let (mut quote, request) = lock_quote(&mut tx, quote_id).await?;
        ensure_owner(client, &request)?;

        if quote.status == QuoteStatus::Approved {
            let (job, created) = JobRepository::ensure_for_request(&mut tx, request.id).await?;
            if created {
                record_job_created(&mut tx, client, job.id).await?;
            }
            tx.commit().await?;
            return Ok(Approval {
                quote,
                job: job.into(),
                newly_approved: false,
            });
        }

        QuoteStateMachine::authorize(quote.status, QuoteStatus::Approved, client.role)?;
        quote.set_status(QuoteStatus::Approved);
        quote.updated_at = Utc::now();
        let quote: Quote = QuoteRepository::save(&mut tx, &quote).await?.into();
        AuditLogRepository::record(
            &mut tx,
            &NewAuditEntry::new(client.id, AuditAction::QuoteApprove, ObjectType::Quote).object(quote.id),
        )
        .await?;

        let (job, created) = JobRepository::ensure_for_request(&mut tx, request.id).await?;
        if created {
            record_job_created(&mut tx, client, job.id).await?;
        }
        tx.commit().await?;

        let job: Job = job.into();
        info!(quote_id = %quote.id, job_id = %job.id, actor = %client.id, "Quote approved");

        let mut recipients = UserRepository::new(self.pool.clone()).staff_handles().await?;
        recipients.push(client.handle.clone());
        dispatch(
            self.notifier.clone(),
            Notification::new(
                "Quote approved",
                recipients,
                NotificationTemplate::QuoteApproved,
                json!({
                    "quote_id": quote.id,
                    "job_id": job.id,
                    "client": client.handle,
                    "file_name": request.original_filename,
                }),
            ),
        );

        Ok(Approval {
            quote,
            job,
            newly_approved: true,
        })
    }

    /// Sent -> Rejected.
    pub async fn reject(&self, client: &User, quote_id: Uuid) -> Result<Quote, ApiError> {
        require(client, Capability::RespondToQuote)?;

        let mut tx = self.pool.begin().await?;
        let (mut quote, request) = lock_quote(&mut tx, quote_id).await?;
        ensure_owner(client, &request)?;

        QuoteStateMachine::authorize(quote.status, QuoteStatus::Rejected, client.role)?;
        quote.set_status(QuoteStatus::Rejected);
        quote.updated_at = Utc::now();
        let quote: Quote = QuoteRepository::save(&mut tx, &quote).await?.into();
        AuditLogRepository::record(
            &mut tx,
            &NewAuditEntry::new(client.id, AuditAction::QuoteReject, ObjectType::Quote).object(quote.id),
        )
        .await?;
        tx.commit().await?;

        info!(quote_id = %quote.id, actor = %client.id, "Quote rejected");
        Ok(quote)
    }

    async fn handle_of(&self, user_id: Uuid) -> Result<Option<String>, ApiError> {
        Ok(UserRepository::new(self.pool.clone())
            .find_by_id(user_id)
            .await?
            .map(|u| u.handle))
    }
}

async fn lock_quote(
    conn: &mut PgConnection,
    quote_id: Uuid,
) -> Result<(Quote, TranslationRequest), ApiError> {
    let quote: Quote = QuoteRepository::lock(conn, quote_id)
        .await?
        .ok_or(DomainError::NotFound("Quote"))?
        .into();
    let request: TranslationRequest = RequestRepository::lock(conn, quote.request_id)
        .await?
        .ok_or(DomainError::NotFound("Request"))?
        .into();
    Ok((quote, request))
}

fn ensure_owner(client: &User, request: &TranslationRequest) -> Result<(), DomainError> {
    if request.client_id == client.id {
        Ok(())
    } else {
        Err(DomainError::forbidden("Only the requesting client can answer this quote"))
    }
}

async fn record_job_created(conn: &mut PgConnection, actor: &User, job_id: Uuid) -> Result<(), sqlx::Error> {
    AuditLogRepository::record(
        conn,
        &NewAuditEntry::new(actor.id, AuditAction::JobCreate, ObjectType::Job).object(job_id),
    )
    .await
    .map(|_| ())
}
