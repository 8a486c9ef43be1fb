//! Live job chat over WebSocket.
//!
//! The socket is upgraded first and admitted second, so a refused viewer
//! gets a proper close frame (1008) instead of a failed handshake. Nothing
//! is registered until admission succeeds.

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
};
use domain::models::{ChatEvent, Job, MessageOutcome, User, EMPTY_MESSAGE_WARNING};
use domain::services::ensure_can_view;
use domain::DomainError;
use persistence::repositories::JobRepository;
use serde::Deserialize;
use std::borrow::Cow;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::authenticate;
use crate::middleware::metrics::{record_chat_connection_closed, record_chat_connection_opened};
use crate::services::MessagingService;

pub const CLOSE_POLICY_VIOLATION: u16 = 1008;
pub const CLOSE_GOING_AWAY: u16 = 1001;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

/// GET /api/v1/ws/jobs/:job_id?token=...
pub async fn job_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<SocketQuery>,
) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state, job_id, query.token))
}

/// Resolves the viewer and re-checks that they may see the job.
pub async fn admit(state: &AppState, token: Option<&str>, job_id: Uuid) -> Result<(User, Job), ApiError> {
    let token = token.ok_or_else(|| ApiError::Unauthorized("Missing token".to_string()))?;
    let user = authenticate(state, token).await?;
    let job: Job = JobRepository::new(state.pool.clone())
        .find_by_id(job_id)
        .await?
        .ok_or(DomainError::NotFound("Job"))?
        .into();
    ensure_can_view(&user, &job)?;
    Ok((user, job))
}

/// Access lost mid-session: the job is gone or the viewer no longer passes `can_view`.
fn is_revoked(error: &ApiError) -> bool {
    matches!(error, ApiError::Forbidden(_) | ApiError::NotFound(_))
}

async fn serve_socket(mut socket: WebSocket, state: AppState, job_id: Uuid, token: Option<String>) {
    let (user, job) = match admit(&state, token.as_deref(), job_id).await {
        Ok(admitted) => admitted,
        Err(e) => {
            debug!(job_id = %job_id, error = %e, "Live channel refused");
            close(&mut socket, CLOSE_POLICY_VIOLATION, "policy violation").await;
            return;
        }
    };

    let mut subscription = state.channels.subscribe(job.id);
    record_chat_connection_opened();
    info!(job_id = %job.id, user_id = %user.id, connection = subscription.id(), "Live channel opened");

    let messaging = MessagingService::new(&state);
    let ping_every = Duration::from_secs(state.config.chat.ping_interval_secs);
    let idle_timeout = Duration::from_secs(state.config.chat.idle_timeout_secs);
    let mut ping = tokio::time::interval(ping_every);
    ping.tick().await;
    let mut last_seen = Instant::now();

    // Every inbound post and every outbound event re-runs the same view check
    // as the HTTP message API, so reassignment cuts a former viewer off.
    loop {
        tokio::select! {
            inbound = socket.recv() => {
                let Some(Ok(frame)) = inbound else { break };
                last_seen = Instant::now();
                match frame {
                    Message::Text(text) => {
                        match messaging.post_for(&user, job.id, &text).await {
                            Ok(MessageOutcome::Posted(_)) => {}
                            Ok(MessageOutcome::Empty) => {
                                let warning = ChatEvent::Warning {
                                    detail: EMPTY_MESSAGE_WARNING.to_string(),
                                };
                                if !send_event(&mut socket, &warning).await {
                                    break;
                                }
                            }
                            Err(e) if is_revoked(&e) => {
                                info!(job_id = %job.id, user_id = %user.id, "Live channel access revoked");
                                close(&mut socket, CLOSE_POLICY_VIOLATION, "policy violation").await;
                                break;
                            }
                            Err(e) => warn!(job_id = %job.id, error = %e, "Live message not stored"),
                        }
                    }
                    Message::Close(_) => break,
                    Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
                }
            }
            outbound = subscription.recv() => {
                let Some(event) = outbound else { break };
                match messaging.visible_job(&user, job.id).await {
                    Ok(_) => {}
                    Err(e) if is_revoked(&e) => {
                        info!(job_id = %job.id, user_id = %user.id, "Live channel access revoked");
                        close(&mut socket, CLOSE_POLICY_VIOLATION, "policy violation").await;
                        break;
                    }
                    Err(e) => {
                        warn!(job_id = %job.id, error = %e, "Live channel access check failed");
                        continue;
                    }
                }
                if !send_event(&mut socket, &event).await {
                    break;
                }
            }
            _ = ping.tick() => {
                if last_seen.elapsed() >= idle_timeout {
                    debug!(job_id = %job.id, user_id = %user.id, "Live channel idle");
                    close(&mut socket, CLOSE_GOING_AWAY, "idle timeout").await;
                    break;
                }
                if let Err(e) = messaging.visible_job(&user, job.id).await {
                    if is_revoked(&e) {
                        close(&mut socket, CLOSE_POLICY_VIOLATION, "policy violation").await;
                        break;
                    }
                }
                if socket.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    let connection = subscription.id();
    drop(subscription);
    record_chat_connection_closed();
    info!(job_id = %job.id, user_id = %user.id, connection, "Live channel closed");
}

async fn send_event(socket: &mut WebSocket, event: &ChatEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            warn!(error = %e, "Chat event not serializable");
            true
        }
    }
}

async fn close(socket: &mut WebSocket, code: u16, reason: &'static str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: Cow::Borrowed(reason),
        })))
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_access_closes_the_channel() {
        assert!(is_revoked(&ApiError::Forbidden("reassigned".into())));
        assert!(is_revoked(&ApiError::NotFound("Job not found".into())));
    }

    #[test]
    fn transient_failures_keep_the_channel() {
        assert!(!is_revoked(&ApiError::Internal("pool timed out".into())));
        assert!(!is_revoked(&ApiError::EmptyMessage));
    }
}
