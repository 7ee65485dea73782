//! # cw-notify-log
//! Log-only implementation of `NotificationSink`.
//!
//! Deployments without a realtime channel still get an auditable trail of
//! every dispatched notification. Delivery is a structured log line; the
//! inbox record written by the service layer remains the source of truth.

use async_trait::async_trait;
use cw_core::models::Notification;
use cw_core::traits::NotificationSink;
use tracing::info;

#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationSink for LogSink {
    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()> {
        info!(
            recipient = %notification.recipient_id,
            kind = notification.kind.as_str(),
            title = %notification.title,
            resource = ?notification.related_resource_id,
            "notification dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_core::models::NotificationKind;
    use uuid::Uuid;

    #[tokio::test]
    async fn dispatch_never_fails() {
        let sink = LogSink::new();
        let notification = Notification::new(
            Uuid::new_v4(),
            NotificationKind::SystemAnnouncement,
            "Reunion",
            "Saturday 3pm in the old gym",
        );
        sink.dispatch(&notification).await.unwrap();
    }
}
