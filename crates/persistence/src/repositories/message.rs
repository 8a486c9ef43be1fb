//! Message repository. Messages are insert-only.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::MessageEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Messages on a job, oldest first.
    pub async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<MessageEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_messages_for_job");
        let result = sqlx::query_as::<_, MessageEntity>(
            r#"
            SELECT m.id, m.job_id, m.user_id, u.handle AS author_handle, m.text, m.created_at
            FROM messages m
            JOIN users u ON u.id = m.user_id
            WHERE m.job_id = $1
            ORDER BY m.created_at, m.seq
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    pub async fn create(
        conn: &mut PgConnection,
        job_id: Uuid,
        user_id: Uuid,
        text: &str,
    ) -> Result<MessageEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_message");
        let result = sqlx::query_as::<_, MessageEntity>(
            r#"
            WITH m AS (
                INSERT INTO messages (job_id, user_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, job_id, user_id, text, created_at
            )
            SELECT m.id, m.job_id, m.user_id, u.handle AS author_handle, m.text, m.created_at
            FROM m
            JOIN users u ON u.id = m.user_id
            "#,
        )
        .bind(job_id)
        .bind(user_id)
        .bind(text)
        .fetch_one(&mut *conn)
        .await;
        timer.record();
        result
    }
}
