//! Invoice repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::InvoiceEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct InvoiceRepository {
    pool: PgPool,
}

impl InvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invoice_by_id");
        let result = sqlx::query_as::<_, InvoiceEntity>(
            r#"
            SELECT id, number, client_id, job_id, amount, currency, status, issued_at,
                   file_path, created_at
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Newest first, optionally for one client.
    pub async fn list(&self, client_id: Option<Uuid>) -> Result<Vec<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_invoices");
        let result = sqlx::query_as::<_, InvoiceEntity>(
            r#"
            SELECT id, number, client_id, job_id, amount, currency, status, issued_at,
                   file_path, created_at
            FROM invoices
            WHERE ($1::uuid IS NULL OR client_id = $1)
            ORDER BY created_at DESC, number DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_invoices");
        let result = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn lock_by_job(
        conn: &mut PgConnection,
        job_id: Uuid,
    ) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_invoice_by_job");
        let result = sqlx::query_as::<_, InvoiceEntity>(
            r#"
            SELECT id, number, client_id, job_id, amount, currency, status, issued_at,
                   file_path, created_at
            FROM invoices
            WHERE job_id = $1
            FOR UPDATE
            "#,
        )
        .bind(job_id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Insert a draft. Returns `None` if the job already has an invoice.
    pub async fn create_draft(
        conn: &mut PgConnection,
        client_id: Uuid,
        job_id: Uuid,
        amount: Decimal,
        currency: &str,
    ) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_invoice_draft");
        let result = sqlx::query_as::<_, InvoiceEntity>(
            r#"
            INSERT INTO invoices (client_id, job_id, amount, currency, status)
            VALUES ($1, $2, $3, $4, 'Draft')
            ON CONFLICT (job_id) DO NOTHING
            RETURNING id, number, client_id, job_id, amount, currency, status, issued_at,
                      file_path, created_at
            "#,
        )
        .bind(client_id)
        .bind(job_id)
        .bind(amount)
        .bind(currency)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Move a draft to Issued. Returns `None` if it was no longer a draft.
    pub async fn mark_issued(
        conn: &mut PgConnection,
        id: Uuid,
        file_path: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<Option<InvoiceEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_invoice_issued");
        let result = sqlx::query_as::<_, InvoiceEntity>(
            r#"
            UPDATE invoices
            SET status = 'Issued', file_path = $2, issued_at = $3
            WHERE id = $1 AND status = 'Draft'
            RETURNING id, number, client_id, job_id, amount, currency, status, issued_at,
                      file_path, created_at
            "#,
        )
        .bind(id)
        .bind(file_path)
        .bind(issued_at)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }
}
