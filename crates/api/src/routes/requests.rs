//! Translation request intake and listing.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use domain::models::{Job, Quote, RequestStatus, Role, TranslationRequest};
use domain::services::can_view_request;
use domain::DomainError;
use persistence::entities::RequestSummary;
use persistence::repositories::{JobRepository, QuoteRepository, RequestFilter, RequestRepository};
use serde::{Deserialize, Serialize};
use shared::pagination::{PageInfo, PageParams};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::intake::{IntakeService, SourceUpload};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRequestBody {
    #[validate(length(min = 2, max = 10))]
    pub source_language: String,
    #[validate(length(min = 2, max = 10))]
    pub target_language: String,
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    /// File content, base64 encoded.
    pub content_base64: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestResponse {
    pub request: TranslationRequest,
    pub status: RequestStatus,
    pub quote: Option<Quote>,
    pub job: Option<Job>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRequestsQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestListResponse {
    pub data: Vec<RequestSummary>,
    pub pagination: PageInfo,
}

/// POST /api/v1/requests (client)
pub async fn create_request(
    State(state): State<AppState>,
    CurrentUser(client): CurrentUser,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<RequestResponse>), ApiError> {
    body.validate()?;
    let content = STANDARD
        .decode(body.content_base64.trim())
        .map_err(|_| ApiError::Validation("content_base64 is not valid base64".to_string()))?;

    let result = IntakeService::new(&state)
        .submit(
            &client,
            SourceUpload {
                source_language: body.source_language,
                target_language: body.target_language,
                file_name: body.file_name,
                content,
            },
        )
        .await?;

    let status = RequestStatus::derive(Some(result.quote.status), None);
    Ok((
        StatusCode::CREATED,
        Json(RequestResponse {
            request: result.request,
            status,
            quote: Some(result.quote),
            job: None,
        }),
    ))
}

/// GET /api/v1/requests
///
/// Clients see their own requests. Staff see all and may search.
pub async fn list_requests(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListRequestsQuery>,
) -> Result<Json<RequestListResponse>, ApiError> {
    let filter = match user.role {
        Role::Client => RequestFilter {
            client_id: Some(user.id),
            search: query.search.clone(),
        },
        Role::Manager | Role::Admin => RequestFilter {
            client_id: None,
            search: query.search.clone(),
        },
        Role::Translator => return Err(ApiError::Forbidden("Translators work from jobs".to_string())),
    };
    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };

    let repo = RequestRepository::new(state.pool.clone());
    let total = repo.count_summaries(&filter).await?;
    let data = repo
        .list_summaries(&filter, params.limit(), params.offset())
        .await?
        .into_iter()
        .map(RequestSummary::from)
        .collect();

    Ok(Json(RequestListResponse {
        data,
        pagination: PageInfo::new(&params, total),
    }))
}

/// GET /api/v1/requests/:request_id
pub async fn get_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestResponse>, ApiError> {
    let request: TranslationRequest = RequestRepository::new(state.pool.clone())
        .find_by_id(request_id)
        .await?
        .ok_or(DomainError::NotFound("Request"))?
        .into();
    if !can_view_request(&user, &request) {
        return Err(ApiError::Forbidden("Not your request".to_string()));
    }

    let quote = QuoteRepository::new(state.pool.clone())
        .find_by_request(request.id)
        .await?
        .map(Quote::from);
    let job = JobRepository::new(state.pool.clone())
        .find_by_request(request.id)
        .await?
        .map(Job::from);
    let status = RequestStatus::derive(quote.as_ref().map(|q| q.status), job.as_ref().map(|j| j.status));

    Ok(Json(RequestResponse {
        request,
        status,
        quote,
        job,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_body_validation() {
        let body = CreateRequestBody {
            source_language: "en".into(),
            target_language: "it".into(),
            file_name: "doc.txt".into(),
            content_base64: STANDARD.encode("hello"),
        };
        assert!(body.validate().is_ok());

        let bad = CreateRequestBody {
            source_language: "e".into(),
            ..body
        };
        assert!(bad.validate().is_err());
    }
}
