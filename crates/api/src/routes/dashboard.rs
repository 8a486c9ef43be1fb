//! Role-scoped dashboard counters.

use axum::{extract::State, Json};
use domain::models::{JobStatus, QuoteStatus, Role};
use persistence::repositories::{InvoiceRepository, JobRepository, JobScope, QuoteRepository, RequestRepository};
use serde::Serialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;

const OPEN_JOB_STATUSES: &[&str] = &["New", "Assigned", "InProgress"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum DashboardStats {
    Client {
        requests: i64,
        pending_quotes: i64,
        delivered_jobs: i64,
    },
    Translator {
        active_jobs: i64,
        delivered_jobs: i64,
    },
    Staff {
        pending_quotes: i64,
        open_jobs: i64,
        invoices: i64,
    },
}

/// GET /api/v1/dashboard/stats
pub async fn get_stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<DashboardStats>, ApiError> {
    let jobs = JobRepository::new(state.pool.clone());
    let quotes = QuoteRepository::new(state.pool.clone());
    let sent = QuoteStatus::Sent.as_str();
    let delivered = [JobStatus::Delivered.as_str(), JobStatus::Accepted.as_str()];

    let stats = match user.role {
        Role::Client => DashboardStats::Client {
            requests: RequestRepository::new(state.pool.clone())
                .count_for_client(user.id)
                .await?,
            pending_quotes: quotes.count_by_status(sent, Some(user.id)).await?,
            delivered_jobs: jobs
                .count_by_statuses(&delivered, JobScope::Client(user.id))
                .await?,
        },
        Role::Translator => DashboardStats::Translator {
            active_jobs: jobs
                .count_by_statuses(
                    &[JobStatus::Assigned.as_str(), JobStatus::InProgress.as_str()],
                    JobScope::Translator(user.id),
                )
                .await?,
            delivered_jobs: jobs
                .count_by_statuses(&delivered, JobScope::Translator(user.id))
                .await?,
        },
        Role::Manager | Role::Admin => DashboardStats::Staff {
            pending_quotes: quotes.count_by_status(sent, None).await?,
            open_jobs: jobs.count_by_statuses(OPEN_JOB_STATUSES, JobScope::All).await?,
            invoices: InvoiceRepository::new(state.pool.clone()).count().await?,
        },
    };
    Ok(Json(stats))
}
