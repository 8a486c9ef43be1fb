//! Shared fixtures for integration tests.
//!
//! Tests run against the PostgreSQL database named by `TEST_DATABASE_URL`
//! and return early when it is not set. Rows are never cleaned up: messages
//! and audit entries are append-only, so every test works with fresh handles.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use domain::models::{Role, User};
use domain::services::RecordingNotifier;
use persistence::repositories::UserRepository;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;
use transdesk_api::{
    app::{create_router, AppState},
    config::Config,
};

pub const PASSWORD: &str = "correct-horse-battery";

/// A router over a fresh storage root with a recording notifier.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub pool: PgPool,
    pub notifier: Arc<RecordingNotifier>,
    _storage: TempDir,
}

/// Connects and migrates, or returns `None` when no test database is configured.
pub async fn test_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&url)
        .await
        .expect("Failed to connect to test database");
    persistence::db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    Some(pool)
}

pub async fn test_app() -> Option<TestApp> {
    test_app_with(|state| state).await
}

/// Like [`test_app`], with a hook to swap collaborators on the state.
pub async fn test_app_with(configure: impl FnOnce(AppState) -> AppState) -> Option<TestApp> {
    let pool = test_pool().await?;
    let storage = TempDir::new().expect("tempdir");
    let root = storage.path().to_string_lossy().to_string();
    let config = Config::load_for_test(&[("storage.root", root.as_str())]).expect("test config");

    let notifier = Arc::new(RecordingNotifier::new());
    let state = configure(
        AppState::new(config, pool.clone())
            .expect("state")
            .with_notifier(notifier.clone()),
    );

    Some(TestApp {
        router: create_router(state.clone()),
        state,
        pool,
        notifier,
        _storage: storage,
    })
}

/// Serves the router on an ephemeral local port and returns its address.
pub async fn serve(app: &TestApp) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    let router = app.router.clone();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Polls until `count` live connections are registered on the job.
pub async fn wait_for_subscribers(app: &TestApp, job_id: uuid::Uuid, count: usize) {
    for _ in 0..100 {
        if app.state.channels.subscriber_count(job_id) == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!(
        "expected {} live connections on job {}, found {}",
        count,
        job_id,
        app.state.channels.subscriber_count(job_id)
    );
}

pub fn unique_handle(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &id[..12])
}

/// Inserts a user directly and returns it with a bearer token.
pub async fn create_user(app: &TestApp, role: Role) -> (User, String) {
    let hash = shared::password::hash_password(PASSWORD).expect("hash");
    let mut conn = app.pool.acquire().await.expect("connection");
    let user: User = UserRepository::create(&mut conn, &unique_handle(role.as_str()), &hash, role.as_str())
        .await
        .expect("create user")
        .into();
    let (token, _) = app
        .state
        .jwt
        .generate_access_token(user.id, role.as_str())
        .expect("token");
    (user, token)
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends a request and parses the JSON body (`Null` when empty).
pub async fn send(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub fn encode(content: &str) -> String {
    STANDARD.encode(content)
}

/// Number of audit entries with `action` on `object_id`.
pub async fn audit_count(pool: &PgPool, action: &str, object_id: uuid::Uuid) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM audit_logs WHERE action = $1 AND object_id = $2")
        .bind(action)
        .bind(object_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Reads a money value whether it was serialized as a string or a number.
pub fn decimal(value: &Value) -> rust_decimal::Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {}", other),
    }
}

/// Participants of a job that has reached `New`.
pub struct ApprovedJob {
    pub client: User,
    pub client_token: String,
    pub manager_token: String,
    pub quote_id: String,
    pub job_id: String,
}

/// Submits a request as a fresh client, sends the quote and approves it.
pub async fn approved_job(app: &TestApp, source_text: &str) -> ApprovedJob {
    let (client, client_token) = create_user(app, Role::Client).await;
    let (_, manager_token) = create_user(app, Role::Manager).await;

    let (status, body) = send(
        app,
        request(
            Method::POST,
            "/api/v1/requests",
            Some(&client_token),
            Some(serde_json::json!({
                "source_language": "en",
                "target_language": "it",
                "file_name": "brochure.txt",
                "content_base64": encode(source_text),
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let quote_id = body["quote"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app,
        request(
            Method::POST,
            &format!("/api/v1/quotes/{}/send", quote_id),
            Some(&manager_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app,
        request(
            Method::POST,
            &format!("/api/v1/quotes/{}/approve", quote_id),
            Some(&client_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let job_id = body["job"]["id"].as_str().unwrap().to_string();

    ApprovedJob {
        client,
        client_token,
        manager_token,
        quote_id,
        job_id,
    }
}
