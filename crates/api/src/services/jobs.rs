//! Job lifecycle operations.
//!
//! Every status change is authorized against `JobStateMachine` with the
//! caller's stored role and commits together with its audit entry.
//! Notifications go out after commit.

use chrono::{DateTime, Utc};
use domain::models::{
    AuditAction, Capability, Job, JobStatus, NewAuditEntry, ObjectType, Quote, Role, Term,
    TranslationRequest, User,
};
use domain::services::{
    ensure_can_view, require, run_quality_checks, JobStateMachine, Notification,
    NotificationTemplate, Notifier, QualityReport,
};
use domain::DomainError;
use persistence::entities::JobSummaryEntity;
use persistence::repositories::{
    AuditLogRepository, JobRepository, JobScope, QuoteRepository, RequestRepository,
    TermRepository, UserRepository,
};
use serde::Serialize;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::notifications::dispatch;
use super::storage::{display_name, FileStorage};
use crate::app::AppState;
use crate::error::ApiError;

/// Everything shown on a job page.
#[derive(Debug, Clone, Serialize)]
pub struct JobDetail {
    pub job: Job,
    pub request: TranslationRequest,
    pub quote: Option<Quote>,
    pub translator_handle: Option<String>,
    pub terms: Vec<Term>,
    /// Statuses the caller may move the job to.
    pub next_states: Vec<JobStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct Assignment {
    pub translator_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Delivery {
    pub translated_text: Option<String>,
    pub file: Option<(String, Vec<u8>)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub job: Job,
    /// Present when translated text was delivered.
    pub quality: Option<QualityReport>,
}

pub struct JobService {
    pool: PgPool,
    storage: FileStorage,
    notifier: Arc<dyn Notifier>,
}

impl JobService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            storage: state.storage.clone(),
            notifier: state.notifier.clone(),
        }
    }

    /// Loads a job `user` is allowed to see.
    pub async fn visible_job(&self, user: &User, job_id: Uuid) -> Result<Job, ApiError> {
        let job: Job = JobRepository::new(self.pool.clone())
            .find_by_id(job_id)
            .await?
            .ok_or(DomainError::NotFound("Job"))?
            .into();
        ensure_can_view(user, &job)?;
        Ok(job)
    }

    pub async fn list(
        &self,
        user: &User,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<JobSummaryEntity>, ApiError> {
        Ok(JobRepository::new(self.pool.clone())
            .list(scope_for(user), limit, offset)
            .await?)
    }

    pub async fn detail(&self, user: &User, job_id: Uuid) -> Result<JobDetail, ApiError> {
        let job = self.visible_job(user, job_id).await?;

        let request: TranslationRequest = RequestRepository::new(self.pool.clone())
            .find_by_id(job.request_id)
            .await?
            .ok_or(DomainError::NotFound("Request"))?
            .into();
        let quote = QuoteRepository::new(self.pool.clone())
            .find_by_request(job.request_id)
            .await?
            .map(Quote::from);
        let translator_handle = match job.translator_id {
            Some(id) => UserRepository::new(self.pool.clone())
                .find_by_id(id)
                .await?
                .map(|u| u.handle),
            None => None,
        };
        let terms = TermRepository::new(self.pool.clone())
            .list(Some(job.client_id))
            .await?
            .into_iter()
            .map(Term::from)
            .collect();
        let next_states = JobStateMachine::next_states(job.status, user.role);

        Ok(JobDetail {
            job,
            request,
            quote,
            translator_handle,
            terms,
            next_states,
        })
    }

    /// Sets or clears the translator, due date and notes.
    pub async fn assign(&self, manager: &User, job_id: Uuid, input: Assignment) -> Result<Job, ApiError> {
        require(manager, Capability::AssignJobs)?;

        let translator: Option<User> = match input.translator_id {
            Some(id) => Some(
                UserRepository::new(self.pool.clone())
                    .find_by_id(id)
                    .await?
                    .ok_or(DomainError::NotFound("Translator"))?
                    .into(),
            ),
            None => None,
        };

        let mut tx = self.pool.begin().await?;
        let mut job = lock_job(&mut tx, job_id).await?;
        if job.status == JobStatus::New && translator.is_some() {
            JobStateMachine::authorize(JobStatus::New, JobStatus::Assigned, manager.role)?;
        }
        job.assign(translator.as_ref(), input.due_date, input.notes)?;

        let job: Job = JobRepository::save(&mut tx, &job).await?.into();
        audit(&mut tx, manager, AuditAction::JobAssign, job.id).await?;
        tx.commit().await?;

        info!(job_id = %job.id, actor = %manager.id, translator = ?job.translator_id, "Job assigned");

        if let Some(translator) = translator {
            let request = self.request_of(&job).await?;
            dispatch(
                self.notifier.clone(),
                Notification::new(
                    "New job assigned",
                    vec![translator.handle],
                    NotificationTemplate::JobAssigned,
                    json!({
                        "job_id": job.id,
                        "source_language": request.source_language,
                        "target_language": request.target_language,
                        "due_date": job.due_date.map(|d| d.to_rfc3339()).unwrap_or_else(|| "not set".into()),
                    }),
                ),
            );
        }
        Ok(job)
    }

    /// Assigned -> InProgress, by the assigned translator.
    pub async fn start(&self, translator: &User, job_id: Uuid) -> Result<Job, ApiError> {
        let mut tx = self.pool.begin().await?;
        let mut job = lock_job(&mut tx, job_id).await?;
        ensure_assignee(translator, &job)?;

        JobStateMachine::advance(&mut job, JobStatus::InProgress, translator.role, Utc::now())?;
        let job: Job = JobRepository::save(&mut tx, &job).await?.into();
        audit(&mut tx, translator, AuditAction::JobStart, job.id).await?;
        tx.commit().await?;

        info!(job_id = %job.id, actor = %translator.id, "Job started");
        Ok(job)
    }

    /// Records the translation and moves the job to Delivered.
    ///
    /// A file is written before the transaction; if the transaction then
    /// fails the file stays behind unreferenced.
    pub async fn deliver(&self, translator: &User, job_id: Uuid, input: Delivery) -> Result<DeliveryOutcome, ApiError> {
        let text = input
            .translated_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        if text.is_none() && input.file.is_none() {
            return Err(ApiError::Validation(
                "Provide the translated text or a file".to_string(),
            ));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut job = lock_job(&mut tx, job_id).await?;
        ensure_assignee(translator, &job)?;
        JobStateMachine::authorize(job.status, JobStatus::Delivered, translator.role)?;

        let request: TranslationRequest = RequestRepository::lock(&mut tx, job.request_id)
            .await?
            .ok_or(DomainError::NotFound("Request"))?
            .into();

        if let Some((file_name, bytes)) = &input.file {
            let path = self
                .storage
                .save_deliverable(job.id, file_name, bytes, now)
                .await?;
            RequestRepository::set_translated_filename(&mut tx, request.id, &path).await?;
            job.delivered_filename = Some(path);
        }

        let quality = text.as_deref().map(|t| run_quality_checks(&request.source_text, t));
        if let Some(report) = &quality {
            if !report.numbers_match {
                warn!(job_id = %job.id, "Delivered text numbers differ from the source");
            }
        }
        if text.is_some() {
            job.translated_text = text;
        }

        job.transition(JobStatus::Delivered, now);
        let job: Job = JobRepository::save(&mut tx, &job).await?.into();
        audit(&mut tx, translator, AuditAction::JobDeliver, job.id).await?;
        tx.commit().await?;

        info!(job_id = %job.id, actor = %translator.id, "Job delivered");

        let mut recipients = UserRepository::new(self.pool.clone()).staff_handles().await?;
        if let Some(client) = UserRepository::new(self.pool.clone())
            .find_by_id(job.client_id)
            .await?
        {
            recipients.push(client.handle);
        }
        dispatch(
            self.notifier.clone(),
            Notification::new(
                "Translation delivered",
                recipients,
                NotificationTemplate::JobDelivered,
                json!({
                    "job_id": job.id,
                    "file_name": request.original_filename,
                    "translator": translator.handle,
                }),
            ),
        );

        Ok(DeliveryOutcome { job, quality })
    }

    /// Delivered -> Accepted. Clears the manager comment.
    pub async fn accept(&self, manager: &User, job_id: Uuid) -> Result<Job, ApiError> {
        require(manager, Capability::ReviewDeliveries)?;

        let mut tx = self.pool.begin().await?;
        let mut job = lock_job(&mut tx, job_id).await?;
        JobStateMachine::advance(&mut job, JobStatus::Accepted, manager.role, Utc::now())?;
        job.manager_comment = None;

        let job: Job = JobRepository::save(&mut tx, &job).await?.into();
        audit(&mut tx, manager, AuditAction::JobAccept, job.id).await?;
        tx.commit().await?;

        info!(job_id = %job.id, actor = %manager.id, "Delivery accepted");
        Ok(job)
    }

    /// Delivered or Accepted -> Assigned, with the manager's reason.
    pub async fn return_to_translator(
        &self,
        manager: &User,
        job_id: Uuid,
        comment: &str,
    ) -> Result<Job, ApiError> {
        require(manager, Capability::ReviewDeliveries)?;
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ApiError::Validation("A comment is required".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        let mut job = lock_job(&mut tx, job_id).await?;
        JobStateMachine::advance(&mut job, JobStatus::Assigned, manager.role, Utc::now())?;
        job.manager_comment = Some(comment.to_string());

        let job: Job = JobRepository::save(&mut tx, &job).await?.into();
        audit(&mut tx, manager, AuditAction::JobReturn, job.id).await?;
        tx.commit().await?;

        info!(job_id = %job.id, actor = %manager.id, "Job returned to translator");
        Ok(job)
    }

    /// The delivered file as `(display name, bytes)`.
    pub async fn deliverable(&self, user: &User, job_id: Uuid) -> Result<(String, Vec<u8>), ApiError> {
        let job = self.visible_job(user, job_id).await?;
        let path = job
            .delivered_filename
            .ok_or(DomainError::NotFound("Deliverable"))?;
        let bytes = self
            .storage
            .read(&path)
            .await?;
        Ok((display_name(&path).to_string(), bytes))
    }

    async fn request_of(&self, job: &Job) -> Result<TranslationRequest, ApiError> {
        Ok(RequestRepository::new(self.pool.clone())
            .find_by_id(job.request_id)
            .await?
            .ok_or(DomainError::NotFound("Request"))?
            .into())
    }
}

pub fn scope_for(user: &User) -> JobScope {
    match user.role {
        Role::Client => JobScope::Client(user.id),
        Role::Translator => JobScope::Translator(user.id),
        Role::Manager | Role::Admin => JobScope::All,
    }
}

async fn lock_job(conn: &mut PgConnection, job_id: Uuid) -> Result<Job, ApiError> {
    Ok(JobRepository::lock(conn, job_id)
        .await?
        .ok_or(DomainError::NotFound("Job"))?
        .into())
}

fn ensure_assignee(user: &User, job: &Job) -> Result<(), DomainError> {
    require(user, Capability::WorkJobs)?;
    if job.is_assigned_to(user.id) {
        Ok(())
    } else {
        Err(DomainError::forbidden("This job is not assigned to you"))
    }
}

async fn audit(conn: &mut PgConnection, actor: &User, action: AuditAction, job_id: Uuid) -> Result<(), sqlx::Error> {
    AuditLogRepository::record(
        conn,
        &NewAuditEntry::new(actor.id, action, ObjectType::Job).object(job_id),
    )
    .await
    .map(|_| ())
}
