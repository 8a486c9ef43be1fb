//! Invoice generation and download.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use domain::models::{Invoice, InvoiceOutcome};
use serde::Serialize;
use uuid::Uuid;

use super::jobs::attachment;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::services::InvoiceService;

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceResponse {
    pub invoice: Invoice,
    pub already_invoiced: bool,
}

impl From<InvoiceOutcome> for InvoiceResponse {
    fn from(outcome: InvoiceOutcome) -> Self {
        match outcome {
            InvoiceOutcome::Issued(invoice) => Self {
                invoice,
                already_invoiced: false,
            },
            InvoiceOutcome::AlreadyInvoiced(invoice) => Self {
                invoice,
                already_invoiced: true,
            },
        }
    }
}

/// POST /api/v1/jobs/:job_id/invoice (staff)
///
/// 201 when issued now, 200 with `already_invoiced` otherwise.
pub async fn generate_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(job_id): Path<Uuid>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let outcome = InvoiceService::new(&state).generate(&user, job_id).await?;
    let status = match outcome {
        InvoiceOutcome::Issued(_) => StatusCode::CREATED,
        InvoiceOutcome::AlreadyInvoiced(_) => StatusCode::OK,
    };
    Ok((status, Json(outcome.into())))
}

/// GET /api/v1/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    Ok(Json(InvoiceService::new(&state).list(&user).await?))
}

/// GET /api/v1/invoices/:invoice_id/download
pub async fn download_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (name, bytes) = InvoiceService::new(&state).download(&user, invoice_id).await?;
    Ok(attachment(&name, bytes))
}
