//! Job chat over plain HTTP.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{MessageOutcome, MessagePayload};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::MessagingService;

#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageRequest {
    pub text: String,
}

/// GET /api/v1/jobs/:job_id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<MessagePayload>>, ApiError> {
    let messages = MessagingService::new(&state)
        .history(&user, job_id)
        .await?
        .into_iter()
        .map(MessagePayload::from)
        .collect();
    Ok(Json(messages))
}

/// POST /api/v1/jobs/:job_id/messages
///
/// 400 `empty_message` when nothing is left after sanitizing.
pub async fn post_message(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
    Json(body): Json<PostMessageRequest>,
) -> Result<(StatusCode, Json<MessagePayload>), ApiError> {
    match MessagingService::new(&state)
        .post_for(&user, job_id, &body.text)
        .await?
    {
        MessageOutcome::Posted(message) => Ok((StatusCode::CREATED, Json(message.into()))),
        MessageOutcome::Empty => Err(ApiError::EmptyMessage),
    }
}
