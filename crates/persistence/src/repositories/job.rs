//! Job repository.
//!
//! Job rows are always read joined with their request so the owning client
//! travels with the job.

use domain::models::Job;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{JobEntity, JobSummaryEntity};
use crate::metrics::QueryTimer;

const JOB_SELECT: &str = r#"
    SELECT j.id, j.request_id, r.client_id, j.translator_id, j.status, j.due_date, j.notes,
           j.manager_comment, j.delivered_filename, j.delivered_at, j.translated_text,
           j.created_at, j.updated_at
    FROM jobs j
    JOIN translation_requests r ON r.id = j.request_id
"#;

const SUMMARY_SELECT: &str = r#"
    SELECT j.id, j.request_id, j.status, r.source_language, r.target_language,
           r.original_filename, r.word_count, c.handle AS client_handle,
           j.translator_id, t.handle AS translator_handle, j.due_date, j.delivered_at,
           j.updated_at
    FROM jobs j
    JOIN translation_requests r ON r.id = j.request_id
    JOIN users c ON c.id = r.client_id
    LEFT JOIN users t ON t.id = j.translator_id
"#;

/// Scope of a job list.
#[derive(Debug, Clone, Copy)]
pub enum JobScope {
    All,
    Client(Uuid),
    Translator(Uuid),
}

#[derive(Clone)]
pub struct JobRepository {
    pool: PgPool,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<JobEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_job_by_id");
        let sql = format!("{} WHERE j.id = $1", JOB_SELECT);
        let result = sqlx::query_as::<_, JobEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_by_request(&self, request_id: Uuid) -> Result<Option<JobEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_job_by_request");
        let sql = format!("{} WHERE j.request_id = $1", JOB_SELECT);
        let result = sqlx::query_as::<_, JobEntity>(&sql)
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Most recently touched first.
    pub async fn list(
        &self,
        scope: JobScope,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<JobSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_jobs");
        let (client_id, translator_id) = match scope {
            JobScope::All => (None, None),
            JobScope::Client(id) => (Some(id), None),
            JobScope::Translator(id) => (None, Some(id)),
        };
        let sql = format!(
            r#"{}
            WHERE ($1::uuid IS NULL OR r.client_id = $1)
              AND ($2::uuid IS NULL OR j.translator_id = $2)
            ORDER BY j.updated_at DESC, j.id
            LIMIT $3 OFFSET $4"#,
            SUMMARY_SELECT
        );
        let result = sqlx::query_as::<_, JobSummaryEntity>(&sql)
            .bind(client_id)
            .bind(translator_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Counts jobs in any of `statuses`, optionally narrowed to a client or translator.
    pub async fn count_by_statuses(
        &self,
        statuses: &[&str],
        scope: JobScope,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_jobs_by_statuses");
        let (client_id, translator_id) = match scope {
            JobScope::All => (None, None),
            JobScope::Client(id) => (Some(id), None),
            JobScope::Translator(id) => (None, Some(id)),
        };
        let statuses: Vec<String> = statuses.iter().map(|s| s.to_string()).collect();
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM jobs j
            JOIN translation_requests r ON r.id = j.request_id
            WHERE j.status = ANY($1)
              AND ($2::uuid IS NULL OR r.client_id = $2)
              AND ($3::uuid IS NULL OR j.translator_id = $3)
            "#,
        )
        .bind(&statuses)
        .bind(client_id)
        .bind(translator_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lock a job row for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<JobEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_job");
        let sql = format!("{} WHERE j.id = $1 FOR UPDATE OF j", JOB_SELECT);
        let result = sqlx::query_as::<_, JobEntity>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await;
        timer.record();
        result
    }

    /// Creates the request's job in `New` unless one exists, then returns it.
    ///
    /// The boolean is true when this call created the job.
    pub async fn ensure_for_request(
        conn: &mut PgConnection,
        request_id: Uuid,
    ) -> Result<(JobEntity, bool), sqlx::Error> {
        let timer = QueryTimer::new("ensure_job_for_request");
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO jobs (request_id, status)
            VALUES ($1, 'New')
            ON CONFLICT (request_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut *conn)
        .await?;

        let sql = format!("{} WHERE j.request_id = $1", JOB_SELECT);
        let job = sqlx::query_as::<_, JobEntity>(&sql)
            .bind(request_id)
            .fetch_one(&mut *conn)
            .await;
        timer.record();
        Ok((job?, inserted.is_some()))
    }

    /// Persist every mutable field of a job.
    pub async fn save(conn: &mut PgConnection, job: &Job) -> Result<JobEntity, sqlx::Error> {
        let timer = QueryTimer::new("save_job");
        let result = sqlx::query_as::<_, JobEntity>(
            r#"
            UPDATE jobs j
            SET translator_id = $2,
                status = $3,
                due_date = $4,
                notes = $5,
                manager_comment = $6,
                delivered_filename = $7,
                delivered_at = $8,
                translated_text = $9,
                updated_at = NOW()
            FROM translation_requests r
            WHERE j.id = $1 AND r.id = j.request_id
            RETURNING j.id, j.request_id, r.client_id, j.translator_id, j.status, j.due_date,
                      j.notes, j.manager_comment, j.delivered_filename, j.delivered_at,
                      j.translated_text, j.created_at, j.updated_at
            "#,
        )
        .bind(job.id)
        .bind(job.translator_id)
        .bind(job.status.as_str())
        .bind(job.due_date)
        .bind(&job.notes)
        .bind(&job.manager_comment)
        .bind(&job.delivered_filename)
        .bind(job.delivered_at)
        .bind(&job.translated_text)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }
}
