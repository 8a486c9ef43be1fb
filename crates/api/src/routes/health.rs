//! Health, readiness and liveness probes.

use axum::{extract::State, http::StatusCode, Json};
use persistence::db;
use serde::Serialize;

use crate::app::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
    pub chat: ChatHealth,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
    pub pool_size: u32,
    pub pool_idle: usize,
}

/// Live channel occupancy.
#[derive(Debug, Serialize)]
pub struct ChatHealth {
    pub jobs: usize,
    pub connections: usize,
}

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub status: &'static str,
}

fn summarize(latency: Option<std::time::Duration>, pool: db::PoolSnapshot, chat: ChatHealth) -> HealthResponse {
    HealthResponse {
        status: if latency.is_some() { "healthy" } else { "unhealthy" },
        version: env!("CARGO_PKG_VERSION"),
        database: DatabaseHealth {
            connected: latency.is_some(),
            latency_ms: latency.map(|d| d.as_millis() as u64),
            pool_size: pool.size,
            pool_idle: pool.idle,
        },
        chat,
    }
}

/// Database round trip plus pool and channel occupancy. 503 when the database is unreachable.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let latency = match db::ping(&state.pool).await {
        Ok(latency) => Some(latency),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            None
        }
    };
    let body = summarize(
        latency,
        db::snapshot(&state.pool),
        ChatHealth {
            jobs: state.channels.job_count(),
            connections: state.channels.connection_count(),
        },
    );
    let status = if body.database.connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

pub async fn live() -> Json<ProbeResponse> {
    Json(ProbeResponse { status: "alive" })
}

pub async fn ready(State(state): State<AppState>) -> Result<Json<ProbeResponse>, StatusCode> {
    db::ping(&state.pool)
        .await
        .map(|_| Json(ProbeResponse { status: "ready" }))
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn chat() -> ChatHealth {
        ChatHealth { jobs: 1, connections: 3 }
    }

    #[test]
    fn healthy_summary_reports_latency_and_chat() {
        let body = summarize(
            Some(Duration::from_millis(5)),
            db::PoolSnapshot { size: 4, idle: 2 },
            chat(),
        );
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"]["latency_ms"], 5);
        assert_eq!(json["database"]["pool_idle"], 2);
        assert_eq!(json["chat"]["connections"], 3);
    }

    #[test]
    fn unreachable_database_is_unhealthy() {
        let body = summarize(None, db::PoolSnapshot { size: 0, idle: 0 }, chat());
        assert_eq!(body.status, "unhealthy");
        assert!(body.database.latency_ms.is_none());
    }

    #[tokio::test]
    async fn live_probe_is_alive() {
        let Json(body) = live().await;
        assert_eq!(body.status, "alive");
    }
}
