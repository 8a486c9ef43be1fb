//! Audit trail queries.

use axum::{
    extract::{Query, State},
    Json,
};
use domain::models::{AuditLogEntry, Capability};
use domain::services::require;
use persistence::repositories::audit_log::MAX_AUDIT_PAGE;
use persistence::repositories::AuditLogRepository;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

const DEFAULT_AUDIT_LIMIT: i64 = 50;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<i64>,
}

impl AuditLogQuery {
    fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_AUDIT_LIMIT).clamp(1, MAX_AUDIT_PAGE)
    }
}

/// GET /api/v1/audit-logs (staff), newest first.
pub async fn list_audit_logs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Vec<AuditLogEntry>>, ApiError> {
    require(&user, Capability::ViewAuditLog)?;
    let entries = AuditLogRepository::new(state.pool.clone())
        .list_recent(query.limit())
        .await?
        .into_iter()
        .map(AuditLogEntry::from)
        .collect();
    Ok(Json(entries))
}
