//! Per-language-pair pricing.

use axum::{extract::State, Json};
use domain::models::{AuditAction, Capability, NewAuditEntry, ObjectType, Rate};
use domain::services::pricing::DEFAULT_CURRENCY;
use domain::services::require;
use persistence::repositories::{AuditLogRepository, RateRepository};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::validation::{normalize_language_code, validate_language_code};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

#[derive(Debug, Clone, Deserialize)]
pub struct UpsertRateRequest {
    pub source_language: String,
    pub target_language: String,
    pub unit_price: Decimal,
    pub currency: Option<String>,
}

/// GET /api/v1/rates (staff)
pub async fn list_rates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Rate>>, ApiError> {
    require(&user, Capability::ManageRates)?;
    let rates = RateRepository::new(state.pool.clone())
        .list()
        .await?
        .into_iter()
        .map(Rate::from)
        .collect();
    Ok(Json(rates))
}

/// PUT /api/v1/rates (staff)
pub async fn upsert_rate(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(body): Json<UpsertRateRequest>,
) -> Result<Json<Rate>, ApiError> {
    require(&user, Capability::ManageRates)?;
    validate_language_code(&body.source_language)?;
    validate_language_code(&body.target_language)?;
    if body.unit_price.is_sign_negative() {
        return Err(ApiError::Validation("unit_price must not be negative".to_string()));
    }
    let currency = body
        .currency
        .map(|c| c.trim().to_uppercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
    let source = normalize_language_code(&body.source_language);
    let target = normalize_language_code(&body.target_language);

    let mut tx = state.pool.begin().await?;
    let rate: Rate = RateRepository::upsert(&mut tx, &source, &target, body.unit_price, &currency)
        .await?
        .into();
    AuditLogRepository::record(
        &mut tx,
        &NewAuditEntry::new(user.id, AuditAction::RateUpdate, ObjectType::Rate).object(rate.id),
    )
    .await?;
    tx.commit().await?;

    info!(
        rate_id = %rate.id,
        pair = %format!("{}->{}", rate.source_language, rate.target_language),
        actor = %user.id,
        "Rate updated"
    );
    Ok(Json(rate))
}
