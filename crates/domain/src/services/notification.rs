//! Outbound notifications.
//!
//! Notifications are dispatched after the triggering change has committed. A
//! failed dispatch is logged by the caller and never undoes that change.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    QuoteSent,
    QuoteApproved,
    JobAssigned,
    JobDelivered,
}

impl NotificationTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTemplate::QuoteSent => "quote_sent",
            NotificationTemplate::QuoteApproved => "quote_approved",
            NotificationTemplate::JobAssigned => "job_assigned",
            NotificationTemplate::JobDelivered => "job_delivered",
        }
    }
}

impl std::fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message to a set of users, addressed by handle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub recipients: Vec<String>,
    pub template: NotificationTemplate,
    pub context: serde_json::Value,
}

impl Notification {
    pub fn new(
        subject: impl Into<String>,
        recipients: Vec<String>,
        template: NotificationTemplate,
        context: serde_json::Value,
    ) -> Self {
        Self {
            subject: subject.into(),
            recipients,
            template,
            context,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Notification provider not configured: {0}")]
    NotConfigured(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Keeps every notification in memory. Used by tests and local runs.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_with(&self, template: NotificationTemplate) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| n.template == template)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
        Ok(())
    }
}
