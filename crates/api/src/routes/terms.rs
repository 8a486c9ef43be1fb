//! Client glossaries.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    AuditAction, Capability, CreateTermRequest, NewAuditEntry, ObjectType, Role, Term,
};
use domain::services::require;
use domain::DomainError;
use persistence::repositories::{AuditLogRepository, TermRepository};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTermsQuery {
    pub client_id: Option<Uuid>,
}

/// GET /api/v1/terms
///
/// Clients always get their own glossary; staff may filter by client.
pub async fn list_terms(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListTermsQuery>,
) -> Result<Json<Vec<Term>>, ApiError> {
    let client_id = match user.role {
        Role::Client => Some(user.id),
        Role::Manager | Role::Admin => query.client_id,
        Role::Translator => return Err(ApiError::Forbidden("Glossaries are shown on jobs".to_string())),
    };
    let terms = TermRepository::new(state.pool.clone())
        .list(client_id)
        .await?
        .into_iter()
        .map(Term::from)
        .collect();
    Ok(Json(terms))
}

/// POST /api/v1/terms (staff)
pub async fn create_term(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<CreateTermRequest>,
) -> Result<(StatusCode, Json<Term>), ApiError> {
    require(&user, Capability::ManageGlossary)?;
    body.validate()?;

    let mut tx = state.pool.begin().await?;
    let term: Term = TermRepository::create(
        &mut tx,
        body.client_id,
        body.source_term.trim(),
        body.target_term.trim(),
        body.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()),
    )
    .await?
    .into();
    AuditLogRepository::record(
        &mut tx,
        &NewAuditEntry::new(user.id, AuditAction::TermCreate, ObjectType::Term).object(term.id),
    )
    .await?;
    tx.commit().await?;

    info!(term_id = %term.id, client_id = %term.client_id, actor = %user.id, "Glossary term added");
    Ok((StatusCode::CREATED, Json(term)))
}

/// DELETE /api/v1/terms/:term_id (staff)
pub async fn delete_term(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(term_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require(&user, Capability::ManageGlossary)?;

    let mut tx = state.pool.begin().await?;
    if !TermRepository::delete(&mut tx, term_id).await? {
        return Err(DomainError::NotFound("Term").into());
    }
    AuditLogRepository::record(
        &mut tx,
        &NewAuditEntry::new(user.id, AuditAction::TermDelete, ObjectType::Term).object(term_id),
    )
    .await?;
    tx.commit().await?;

    info!(term_id = %term_id, actor = %user.id, "Glossary term deleted");
    Ok(StatusCode::NO_CONTENT)
}
