//! Job lifecycle endpoints.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use domain::models::Job;
use persistence::entities::JobSummaryEntity;
use serde::{Deserialize, Serialize};
use shared::pagination::PageParams;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::jobs::{Assignment, Delivery, DeliveryOutcome, JobDetail, JobService};

#[derive(Debug, Clone, Serialize)]
pub struct JobListResponse {
    pub data: Vec<JobSummaryEntity>,
    pub page: i64,
    pub per_page: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignJobRequest {
    pub translator_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliverJobRequest {
    pub translated_text: Option<String>,
    pub file_name: Option<String>,
    pub content_base64: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnJobRequest {
    pub comment: String,
}

/// GET /api/v1/jobs
pub async fn list_jobs(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<PageParams>,
) -> Result<Json<JobListResponse>, ApiError> {
    let data = JobService::new(&state)
        .list(&user, params.limit(), params.offset())
        .await?;
    Ok(Json(JobListResponse {
        data,
        page: params.page(),
        per_page: params.per_page(),
    }))
}

/// GET /api/v1/jobs/:job_id
pub async fn get_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobDetail>, ApiError> {
    Ok(Json(JobService::new(&state).detail(&user, job_id).await?))
}

/// POST /api/v1/jobs/:job_id/assign (staff)
pub async fn assign_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
    Json(body): Json<AssignJobRequest>,
) -> Result<Json<Job>, ApiError> {
    let job = JobService::new(&state)
        .assign(
            &user,
            job_id,
            Assignment {
                translator_id: body.translator_id,
                due_date: body.due_date,
                notes: body.notes.filter(|n| !n.trim().is_empty()),
            },
        )
        .await?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/:job_id/start (assigned translator)
pub async fn start_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(JobService::new(&state).start(&user, job_id).await?))
}

/// POST /api/v1/jobs/:job_id/deliver (assigned translator)
pub async fn deliver_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
    Json(body): Json<DeliverJobRequest>,
) -> Result<Json<DeliveryOutcome>, ApiError> {
    let file = match (body.file_name, body.content_base64) {
        (Some(name), Some(content)) => {
            let bytes = STANDARD
                .decode(content.trim())
                .map_err(|_| ApiError::Validation("content_base64 is not valid base64".to_string()))?;
            Some((name, bytes))
        }
        (None, None) => None,
        _ => {
            return Err(ApiError::Validation(
                "file_name and content_base64 go together".to_string(),
            ))
        }
    };

    let outcome = JobService::new(&state)
        .deliver(
            &user,
            job_id,
            Delivery {
                translated_text: body.translated_text,
                file,
            },
        )
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/jobs/:job_id/accept (staff)
pub async fn accept_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, ApiError> {
    Ok(Json(JobService::new(&state).accept(&user, job_id).await?))
}

/// POST /api/v1/jobs/:job_id/return (staff)
pub async fn return_job(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
    Json(body): Json<ReturnJobRequest>,
) -> Result<Json<Job>, ApiError> {
    let job = JobService::new(&state)
        .return_to_translator(&user, job_id, &body.comment)
        .await?;
    Ok(Json(job))
}

/// GET /api/v1/jobs/:job_id/deliverable
pub async fn download_deliverable(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, bytes) = JobService::new(&state).deliverable(&user, job_id).await?;
    Ok(attachment(&name, bytes))
}

/// A download response with a content disposition.
pub(crate) fn attachment(name: &str, bytes: Vec<u8>) -> impl IntoResponse {
    let disposition = format!("attachment; filename=\"{}\"", name.replace('"', ""));
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
}
