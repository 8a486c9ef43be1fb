//! Fire-and-forget notification dispatch.

use domain::services::{Notification, Notifier};
use std::sync::Arc;
use tracing::warn;

/// Spawns delivery on the runtime. Call only after the triggering change has
/// committed; failures are logged and dropped.
pub fn dispatch(notifier: Arc<dyn Notifier>, notification: Notification) {
    if notification.recipients.is_empty() {
        return;
    }
    tokio::spawn(async move {
        let template = notification.template;
        if let Err(e) = notifier.notify(notification).await {
            warn!(template = %template, error = %e, "Notification dispatch failed");
        }
    });
}
