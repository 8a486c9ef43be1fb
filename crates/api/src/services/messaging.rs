//! Job chat: persisting messages and fanning them out to live connections.

use domain::models::{
    AuditAction, ChatEvent, Job, Message, MessageOutcome, MessagePayload, NewAuditEntry,
    ObjectType, User,
};
use domain::services::{ensure_can_view, sanitize_message, ChannelRegistry};
use domain::DomainError;
use persistence::repositories::{AuditLogRepository, JobRepository, MessageRepository};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::app::{AppState, JobLocks};
use crate::error::ApiError;
use crate::middleware::metrics::record_chat_broadcast;

pub struct MessagingService {
    pool: PgPool,
    channels: Arc<ChannelRegistry<ChatEvent>>,
    job_locks: JobLocks,
}

impl MessagingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            pool: state.pool.clone(),
            channels: state.channels.clone(),
            job_locks: state.job_locks.clone(),
        }
    }

    /// Messages of a job in posting order.
    pub async fn history(&self, user: &User, job_id: Uuid) -> Result<Vec<Message>, ApiError> {
        self.visible_job(user, job_id).await?;
        Ok(MessageRepository::new(self.pool.clone())
            .list_for_job(job_id)
            .await?
            .into_iter()
            .map(Message::from)
            .collect())
    }

    /// Loads the job and posts to it on behalf of `author`.
    pub async fn post_for(&self, author: &User, job_id: Uuid, raw: &str) -> Result<MessageOutcome, ApiError> {
        let job = self.visible_job(author, job_id).await?;
        self.post(author, &job, raw).await
    }

    /// Sanitizes, stores and broadcasts one message.
    ///
    /// Access to `job` must already be checked. Posts to the same job are
    /// serialized so storage order and broadcast order agree.
    pub async fn post(&self, author: &User, job: &Job, raw: &str) -> Result<MessageOutcome, ApiError> {
        let Some(text) = sanitize_message(raw) else {
            return Ok(MessageOutcome::Empty);
        };

        let _guard = self.job_locks.acquire(job.id).await;

        let mut tx = self.pool.begin().await?;
        let message: Message = MessageRepository::create(&mut tx, job.id, author.id, &text)
            .await?
            .into();
        AuditLogRepository::record(
            &mut tx,
            &NewAuditEntry::new(author.id, AuditAction::MessagePost, ObjectType::Message)
                .object(message.id),
        )
        .await?;
        tx.commit().await?;

        let event = ChatEvent::Message(MessagePayload::from(message.clone()));
        let report = self.channels.broadcast(job.id, &event);
        record_chat_broadcast(report.delivered, report.dropped);
        debug!(
            job_id = %job.id,
            message_id = %message.id,
            delivered = report.delivered,
            dropped = report.dropped,
            "Message broadcast"
        );

        Ok(MessageOutcome::Posted(message))
    }

    /// Re-reads the job and re-runs the view check for `user`.
    pub async fn visible_job(&self, user: &User, job_id: Uuid) -> Result<Job, ApiError> {
        let job: Job = JobRepository::new(self.pool.clone())
            .find_by_id(job_id)
            .await?
            .ok_or(DomainError::NotFound("Job"))?
            .into();
        ensure_can_view(user, &job)?;
        Ok(job)
    }
}
