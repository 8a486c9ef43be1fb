//! Email delivery of workflow notifications.
//!
//! Supported providers:
//! - `console`: Logs emails (development)
//! - `sendgrid`: Uses the SendGrid API

use async_trait::async_trait;
use domain::services::{Notification, NotificationError, NotificationTemplate, Notifier};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

/// A rendered email.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body_text: String,
}

#[derive(Clone)]
pub struct EmailNotifier {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    fn address(&self, handle: &str) -> String {
        format!("{}@{}", handle, self.config.recipient_domain)
    }

    /// Renders a notification into an email.
    pub fn render(&self, notification: &Notification) -> EmailMessage {
        let ctx = &notification.context;
        let field = |key: &str| -> String {
            match ctx.get(key) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            }
        };
        let link = |path: String| format!("{}{}", self.config.base_url, path);

        let body_text = match notification.template {
            NotificationTemplate::QuoteSent => format!(
                "Hello,\n\nYour quote for {} is ready: {} {} for {} words.\n\
                 Review and approve it at {}\n",
                field("file_name"),
                field("total"),
                field("currency"),
                field("word_count"),
                link(format!("/quotes/{}", field("quote_id"))),
            ),
            NotificationTemplate::QuoteApproved => format!(
                "Hello,\n\nThe quote for {} was approved by {}. Job {} is ready to be assigned.\n\
                 {}\n",
                field("file_name"),
                field("client"),
                field("job_id"),
                link(format!("/jobs/{}", field("job_id"))),
            ),
            NotificationTemplate::JobAssigned => format!(
                "Hello,\n\nYou have been assigned job {} ({} -> {}). Due: {}.\n{}\n",
                field("job_id"),
                field("source_language"),
                field("target_language"),
                field("due_date"),
                link(format!("/jobs/{}", field("job_id"))),
            ),
            NotificationTemplate::JobDelivered => format!(
                "Hello,\n\nJob {} for {} has been delivered by {}.\n{}\n",
                field("job_id"),
                field("file_name"),
                field("translator"),
                link(format!("/jobs/{}", field("job_id"))),
            ),
        };

        EmailMessage {
            to: notification
                .recipients
                .iter()
                .map(|h| self.address(h))
                .collect(),
            subject: notification.subject.clone(),
            body_text,
        }
    }

    async fn send_console(&self, message: EmailMessage) -> Result<(), NotificationError> {
        info!(
            to = ?message.to,
            subject = %message.subject,
            from = %self.config.sender_email,
            "Email (console provider)"
        );
        debug!(body_text = %message.body_text, "Email body");
        Ok(())
    }

    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), NotificationError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(NotificationError::NotConfigured(
                "sendgrid_api_key is empty".to_string(),
            ));
        }

        let to: Vec<serde_json::Value> = message
            .to
            .iter()
            .map(|address| serde_json::json!({ "email": address }))
            .collect();

        let body = serde_json::json!({
            "personalizations": [{ "to": to }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{
                "type": "text/plain",
                "value": message.body_text
            }]
        });

        let response = self
            .client
            .post("https://api.sendgrid.com/v3/mail/send")
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = ?message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "SendGrid API error");
            Err(NotificationError::Delivery(format!(
                "SendGrid returned {}",
                status
            )))
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        if notification.recipients.is_empty() {
            return Ok(());
        }

        if !self.config.enabled {
            debug!(
                template = %notification.template,
                recipients = ?notification.recipients,
                "Email disabled, skipping notification"
            );
            return Ok(());
        }

        let message = self.render(&notification);
        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "sendgrid" => self.send_sendgrid(message).await,
            provider => Err(NotificationError::NotConfigured(format!(
                "unknown email provider {}",
                provider
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn notifier(enabled: bool, provider: &str) -> EmailNotifier {
        EmailNotifier::new(EmailConfig {
            enabled,
            provider: provider.to_string(),
            base_url: "https://office.example".to_string(),
            ..EmailConfig::default()
        })
    }

    #[test]
    fn test_render_quote_sent() {
        let notification = Notification::new(
            "Your quote is ready",
            vec!["acme".into()],
            NotificationTemplate::QuoteSent,
            json!({
                "quote_id": "q1",
                "file_name": "brochure.txt",
                "total": "100.00",
                "currency": "EUR",
                "word_count": 1000
            }),
        );

        let message = notifier(true, "console").render(&notification);

        assert_eq!(message.to, vec!["acme@transdesk.local".to_string()]);
        assert!(message.body_text.contains("100.00 EUR for 1000 words"));
        assert!(message.body_text.contains("https://office.example/quotes/q1"));
    }

    #[tokio::test]
    async fn test_disabled_is_noop() {
        let notification = Notification::new(
            "x",
            vec!["translator1".into()],
            NotificationTemplate::JobAssigned,
            json!({}),
        );
        assert!(notifier(false, "nonsense").notify(notification).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let notification = Notification::new(
            "x",
            vec!["translator1".into()],
            NotificationTemplate::JobAssigned,
            json!({}),
        );
        assert!(matches!(
            notifier(true, "pigeon").notify(notification).await,
            Err(NotificationError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_sendgrid_requires_key() {
        let notification = Notification::new(
            "x",
            vec!["acme".into()],
            NotificationTemplate::JobDelivered,
            json!({}),
        );
        assert!(matches!(
            notifier(true, "sendgrid").notify(notification).await,
            Err(NotificationError::NotConfigured(_))
        ));
    }
}
