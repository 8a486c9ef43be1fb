//! Rate table repository.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::entities::RateEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct RateRepository {
    pool: PgPool,
}

impl RateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<RateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_rates");
        let result = sqlx::query_as::<_, RateEntity>(
            r#"
            SELECT id, source_language, target_language, unit_price, currency
            FROM rates
            ORDER BY source_language, target_language
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Rate for a language pair. Codes are stored normalized.
    pub async fn find_for_pair(
        conn: &mut PgConnection,
        source_language: &str,
        target_language: &str,
    ) -> Result<Option<RateEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_rate_for_pair");
        let result = sqlx::query_as::<_, RateEntity>(
            r#"
            SELECT id, source_language, target_language, unit_price, currency
            FROM rates
            WHERE source_language = $1 AND target_language = $2
            "#,
        )
        .bind(source_language)
        .bind(target_language)
        .fetch_optional(&mut *conn)
        .await;
        timer.record();
        result
    }

    pub async fn upsert(
        conn: &mut PgConnection,
        source_language: &str,
        target_language: &str,
        unit_price: Decimal,
        currency: &str,
    ) -> Result<RateEntity, sqlx::Error> {
        let timer = QueryTimer::new("upsert_rate");
        let result = sqlx::query_as::<_, RateEntity>(
            r#"
            INSERT INTO rates (source_language, target_language, unit_price, currency)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (source_language, target_language)
            DO UPDATE SET unit_price = EXCLUDED.unit_price,
                          currency = EXCLUDED.currency,
                          updated_at = NOW()
            RETURNING id, source_language, target_language, unit_price, currency
            "#,
        )
        .bind(source_language)
        .bind(target_language)
        .bind(unit_price)
        .bind(currency)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }
}
