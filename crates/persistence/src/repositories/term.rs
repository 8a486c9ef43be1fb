//! Glossary term repository.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::TermEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct TermRepository {
    pool: PgPool,
}

impl TermRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Terms sorted by source term, optionally for one client.
    pub async fn list(&self, client_id: Option<Uuid>) -> Result<Vec<TermEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_terms");
        let result = sqlx::query_as::<_, TermEntity>(
            r#"
            SELECT id, client_id, source_term, target_term, notes, created_at
            FROM terms
            WHERE ($1::uuid IS NULL OR client_id = $1)
            ORDER BY source_term, id
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        conn: &mut PgConnection,
        client_id: Uuid,
        source_term: &str,
        target_term: &str,
        notes: Option<&str>,
    ) -> Result<TermEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_term");
        let result = sqlx::query_as::<_, TermEntity>(
            r#"
            INSERT INTO terms (client_id, source_term, target_term, notes)
            VALUES ($1, $2, $3, $4)
            RETURNING id, client_id, source_term, target_term, notes, created_at
            "#,
        )
        .bind(client_id)
        .bind(source_term)
        .bind(target_term)
        .bind(notes)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Returns false when no such term exists.
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_term");
        let result = sqlx::query("DELETE FROM terms WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }
}
