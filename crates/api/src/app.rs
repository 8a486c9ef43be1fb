use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use domain::models::ChatEvent;
use domain::services::{ChannelRegistry, InvoiceRenderer, Notifier, PlainTextExtractor, TextExtractor};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{
    audit_logs, auth, dashboard, health, invoices, jobs, messages, quotes, rates, requests,
    terms, users, ws,
};
use crate::services::{EmailNotifier, FileStorage, TextInvoiceRenderer};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub channels: Arc<ChannelRegistry<ChatEvent>>,
    pub job_locks: JobLocks,
    pub notifier: Arc<dyn Notifier>,
    pub extractor: Arc<dyn TextExtractor>,
    pub renderer: Arc<dyn InvoiceRenderer>,
    pub storage: FileStorage,
}

impl AppState {
    /// State with the built-in collaborators.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        let jwt = JwtConfig::new(
            &config.jwt.secret,
            &config.jwt.issuer,
            config.jwt.access_token_expiry_secs,
            config.jwt.leeway_secs,
        )?;
        let storage = FileStorage::new(config.storage.root.clone());

        Ok(Self {
            pool,
            jwt: Arc::new(jwt),
            channels: Arc::new(ChannelRegistry::new(config.chat.subscriber_buffer)),
            job_locks: JobLocks::default(),
            notifier: Arc::new(EmailNotifier::new(config.email.clone())),
            extractor: Arc::new(PlainTextExtractor),
            renderer: Arc::new(TextInvoiceRenderer::new(storage.clone())),
            storage,
            config: Arc::new(config),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn InvoiceRenderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

/// One async mutex per job, created on demand.
///
/// Entries nobody holds are pruned on the next acquire.
#[derive(Clone, Default)]
pub struct JobLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<tokio::sync::Mutex<()>>>>>,
}

impl JobLocks {
    pub async fn acquire(&self, job_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|id, lock| *id == job_id || Arc::strong_count(lock) > 1);
            map.entry(job_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    Ok(create_router(AppState::new(config, pool)?))
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let auth_routes = Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login));

    let user_routes = Router::new()
        .route("/api/v1/users", post(users::create_user))
        .route("/api/v1/users/me", get(users::me))
        .route("/api/v1/users/translators", get(users::list_translators));

    let request_routes = Router::new()
        .route(
            "/api/v1/requests",
            post(requests::create_request).get(requests::list_requests),
        )
        .route("/api/v1/requests/:request_id", get(requests::get_request));

    let quote_routes = Router::new()
        .route(
            "/api/v1/quotes/:quote_id",
            get(quotes::get_quote).put(quotes::update_quote),
        )
        .route("/api/v1/quotes/:quote_id/send", post(quotes::send_quote))
        .route("/api/v1/quotes/:quote_id/approve", post(quotes::approve_quote))
        .route("/api/v1/quotes/:quote_id/reject", post(quotes::reject_quote));

    let job_routes = Router::new()
        .route("/api/v1/jobs", get(jobs::list_jobs))
        .route("/api/v1/jobs/:job_id", get(jobs::get_job))
        .route("/api/v1/jobs/:job_id/assign", post(jobs::assign_job))
        .route("/api/v1/jobs/:job_id/start", post(jobs::start_job))
        .route("/api/v1/jobs/:job_id/deliver", post(jobs::deliver_job))
        .route("/api/v1/jobs/:job_id/accept", post(jobs::accept_job))
        .route("/api/v1/jobs/:job_id/return", post(jobs::return_job))
        .route(
            "/api/v1/jobs/:job_id/deliverable",
            get(jobs::download_deliverable),
        )
        .route(
            "/api/v1/jobs/:job_id/messages",
            get(messages::list_messages).post(messages::post_message),
        )
        .route("/api/v1/jobs/:job_id/invoice", post(invoices::generate_invoice))
        .route("/api/v1/ws/jobs/:job_id", get(ws::job_socket));

    let office_routes = Router::new()
        .route("/api/v1/invoices", get(invoices::list_invoices))
        .route(
            "/api/v1/invoices/:invoice_id/download",
            get(invoices::download_invoice),
        )
        .route("/api/v1/terms", get(terms::list_terms).post(terms::create_term))
        .route("/api/v1/terms/:term_id", delete(terms::delete_term))
        .route("/api/v1/rates", get(rates::list_rates).put(rates::upsert_rate))
        .route("/api/v1/dashboard/stats", get(dashboard::get_stats))
        .route("/api/v1/audit-logs", get(audit_logs::list_audit_logs));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(user_routes)
        .merge(request_routes)
        .merge(quote_routes)
        .merge(job_routes)
        .merge(office_routes)
        // Global middleware (bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
