//! Translation request repository.

use domain::models::NewTranslationRequest;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{RequestEntity, RequestSummaryEntity};
use crate::metrics::QueryTimer;

/// Filters for request list views.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    /// Restrict to one client's requests.
    pub client_id: Option<Uuid>,
    /// Case-insensitive substring of client handle or language codes.
    pub search: Option<String>,
}

impl RequestFilter {
    fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref()?.trim();
        if term.is_empty() {
            return None;
        }
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{}%", escaped))
    }
}

const SUMMARY_SELECT: &str = r#"
    SELECT r.id, r.client_id, u.handle AS client_handle, r.source_language, r.target_language,
           r.original_filename, r.word_count, r.extraction_error, r.created_at,
           q.id AS quote_id, q.status AS quote_status, q.total AS quote_total,
           q.currency AS quote_currency, j.id AS job_id, j.status AS job_status
    FROM translation_requests r
    JOIN users u ON u.id = r.client_id
    LEFT JOIN quotes q ON q.request_id = r.id
    LEFT JOIN jobs j ON j.request_id = r.id
"#;

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::uuid IS NULL OR r.client_id = $1)
      AND ($2::text IS NULL
           OR u.handle ILIKE $2
           OR r.source_language ILIKE $2
           OR r.target_language ILIKE $2)
"#;

#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<RequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_request_by_id");
        let result = sqlx::query_as::<_, RequestEntity>(
            r#"
            SELECT id, client_id, source_language, target_language, original_filename,
                   translated_filename, word_count, source_text, extraction_error, created_at
            FROM translation_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// One request with its derived-status inputs.
    pub async fn find_summary(&self, id: Uuid) -> Result<Option<RequestSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_request_summary");
        let sql = format!("{} WHERE r.id = $1", SUMMARY_SELECT);
        let result = sqlx::query_as::<_, RequestSummaryEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Newest first.
    pub async fn list_summaries(
        &self,
        filter: &RequestFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RequestSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_request_summaries");
        let sql = format!(
            "{} {} ORDER BY r.created_at DESC, r.id LIMIT $3 OFFSET $4",
            SUMMARY_SELECT, FILTER_CLAUSE
        );
        let result = sqlx::query_as::<_, RequestSummaryEntity>(&sql)
            .bind(filter.client_id)
            .bind(filter.search_pattern())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn count_summaries(&self, filter: &RequestFilter) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_request_summaries");
        let sql = format!(
            r#"
            SELECT COUNT(*)
            FROM translation_requests r
            JOIN users u ON u.id = r.client_id
            {}
            "#,
            FILTER_CLAUSE
        );
        let result = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.client_id)
            .bind(filter.search_pattern())
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn count_for_client(&self, client_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_requests_for_client");
        let result = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM translation_requests WHERE client_id = $1",
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        conn: &mut PgConnection,
        request: &NewTranslationRequest,
    ) -> Result<RequestEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_request");
        let result = sqlx::query_as::<_, RequestEntity>(
            r#"
            INSERT INTO translation_requests
                (client_id, source_language, target_language, original_filename,
                 word_count, source_text, extraction_error)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, client_id, source_language, target_language, original_filename,
                      translated_filename, word_count, source_text, extraction_error, created_at
            "#,
        )
        .bind(request.client_id)
        .bind(&request.source_language)
        .bind(&request.target_language)
        .bind(&request.original_filename)
        .bind(request.word_count)
        .bind(&request.source_text)
        .bind(&request.extraction_error)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }

    /// Lock a request row for the rest of the transaction.
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<RequestEntity>, sqlx::Error> {
        let timer = QueryTimer::new("lock_request");
        let result = sqlx::query_as::<_, RequestEntity>(
            r#"
            SELECT id, client_id, source_language, target_language, original_filename,
                   translated_filename, word_count, source_text, extraction_error, created_at
            FROM translation_requests
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

    pub async fn set_word_count(
        conn: &mut PgConnection,
        id: Uuid,
        word_count: i32,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("set_request_word_count");
        sqlx::query("UPDATE translation_requests SET word_count = $2 WHERE id = $1")
            .bind(id)
            .bind(word_count)
            .execute(&mut *conn)
            .await?;
        timer.record();
        Ok(())
    }

    pub async fn set_translated_filename(
        conn: &mut PgConnection,
        id: Uuid,
        filename: &str,
    ) -> Result<(), sqlx::Error> {
        let timer = QueryTimer::new("set_request_translated_filename");
        sqlx::query("UPDATE translation_requests SET translated_filename = $2 WHERE id = $1")
            .bind(id)
            .bind(filename)
            .execute(&mut *conn)
            .await?;
        timer.record();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filter = RequestFilter {
            client_id: None,
            search: Some(" 50%_off ".into()),
        };
        assert_eq!(filter.search_pattern().as_deref(), Some("%50\\%\\_off%"));
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let filter = RequestFilter {
            client_id: None,
            search: Some("   ".into()),
        };
        assert_eq!(filter.search_pattern(), None);
        assert_eq!(RequestFilter::default().search_pattern(), None);
    }
}
