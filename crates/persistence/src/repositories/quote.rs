//! Quote repository.

use domain::models::Quote;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::QuoteEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct QuoteRepository {
    pool: PgPool,
}

impl QuoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<QuoteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_quote_by_id");
        let result = sqlx::query_as::<_, QuoteEntity>(
            r#"
            SELECT id, request_id, word_count, unit_price, currency, total, status,
                   created_at, updated_at
            FROM quotes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn find_by_request(&self, request_id: Uuid) -> Result<Option<QuoteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_quote_by_request");
        let result = sqlx::query_as::<_, QuoteEntity>(
            r#"
            SELECT id, request_id, word_count, unit_price, currency, total, status,
                   created_at, updated_at
            FROM quotes
            WHERE request_id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Counts quotes in a status, optionally for one client.
    pub async fn count_by_status(
        &self,
        status: &str,
        client_id: Option<Uuid>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_quotes_by_status");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM quotes q
            JOIN translation_requests r ON r.id = q.request_id
            WHERE q.status = $1
              AND ($2::uuid IS NULL OR r.client_id = $2)
            "#,
        )
        .bind(status)
        .bind(client_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Lock a quote row for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<QuoteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_quote");
        let result = sqlx::query_as::<_, QuoteEntity>(
            r#"
            SELECT id, request_id, word_count, unit_price, currency, total, status,
                   created_at, updated_at
            FROM quotes
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    pub async fn lock_by_request(
        conn: &mut PgConnection,
        request_id: Uuid,
    ) -> Result<Option<QuoteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_quote_by_request");
        let result = sqlx::query_as::<_, QuoteEntity>(
            r#"
            SELECT id, request_id, word_count, unit_price, currency, total, status,
                   created_at, updated_at
            FROM quotes
            WHERE request_id = $1
            FOR UPDATE
            "#,
        )
        .bind(request_id)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Insert a new quote or overwrite the priced fields and status of an existing one.
    pub async fn save(conn: &mut PgConnection, quote: &Quote) -> Result<QuoteEntity, sqlx::Error> {
        let timer = QueryTimer::new("save_quote");
        let result = sqlx::query_as::<_, QuoteEntity>(
            r#"
            INSERT INTO quotes
                (id, request_id, word_count, unit_price, currency, total, status,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE
            SET word_count = EXCLUDED.word_count,
                unit_price = EXCLUDED.unit_price,
                currency = EXCLUDED.currency,
                total = EXCLUDED.total,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at
            RETURNING id, request_id, word_count, unit_price, currency, total, status,
                      created_at, updated_at
            "#,
        )
        .bind(quote.id)
        .bind(quote.request_id)
        .bind(quote.word_count)
        .bind(quote.unit_price)
        .bind(&quote.currency)
        .bind(quote.total)
        .bind(quote.status.as_str())
        .bind(quote.created_at)
        .bind(quote.updated_at)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }
}
