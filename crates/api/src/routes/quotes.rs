//! Quote review and decisions.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{Job, Quote, TranslationRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::quotes::{QuoteService, Reprice};

#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    pub quote: Quote,
    pub request: TranslationRequest,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuoteRequest {
    pub unit_price: Option<Decimal>,
    pub word_count: Option<i32>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalResponse {
    pub quote: Quote,
    pub job: Job,
    pub already_approved: bool,
}

/// GET /api/v1/quotes/:quote_id
pub async fn get_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let (quote, request) = QuoteService::new(&state).get(&user, quote_id).await?;
    Ok(Json(QuoteResponse { quote, request }))
}

/// PUT /api/v1/quotes/:quote_id (staff)
pub async fn update_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(quote_id): Path<Uuid>,
    Json(body): Json<UpdateQuoteRequest>,
) -> Result<Json<Quote>, ApiError> {
    if body.word_count.is_some_and(|w| w < 0) {
        return Err(ApiError::Validation("word_count must not be negative".to_string()));
    }
    if body.unit_price.is_some_and(|p| p.is_sign_negative()) {
        return Err(ApiError::Validation("unit_price must not be negative".to_string()));
    }

    let quote = QuoteService::new(&state)
        .reprice(
            &user,
            quote_id,
            Reprice {
                unit_price: body.unit_price,
                word_count: body.word_count,
                currency: body.currency,
            },
        )
        .await?;
    Ok(Json(quote))
}

/// POST /api/v1/quotes/:quote_id/send (staff)
pub async fn send_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(QuoteService::new(&state).send(&user, quote_id).await?))
}

/// POST /api/v1/quotes/:quote_id/approve (owning client)
pub async fn approve_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<ApprovalResponse>, ApiError> {
    let approval = QuoteService::new(&state).approve(&user, quote_id).await?;
    Ok(Json(ApprovalResponse {
        quote: approval.quote,
        job: approval.job,
        already_approved: !approval.newly_approved,
    }))
}

/// POST /api/v1/quotes/:quote_id/reject (owning client)
pub async fn reject_quote(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(quote_id): Path<Uuid>,
) -> Result<Json<Quote>, ApiError> {
    Ok(Json(QuoteService::new(&state).reject(&user, quote_id).await?))
}
