//! # Notification Inbox & Dispatcher
//!
//! Owns *when* and *with what payload* the fan-out collaborator is called.
//! Every notification is first persisted to the inbox, then handed to the
//! injected [`NotificationSink`]; sink failure is logged and swallowed, it
//! never fails the operation that triggered the notification.

use std::sync::Arc;

use cw_core::error::{AppError, Result};
use cw_core::models::{Decision, IdentityType, Notification, NotificationKind, Role, Viewer};
use cw_core::traits::{NotificationRepo, NotificationSink, ProfileRepo};
use tracing::warn;
use uuid::Uuid;

/// How an actor touched someone else's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Liked,
    Commented,
}

pub struct InboxService {
    notifications: Arc<dyn NotificationRepo>,
    profiles: Arc<dyn ProfileRepo>,
    sink: Arc<dyn NotificationSink>,
}

impl InboxService {
    pub fn new(
        notifications: Arc<dyn NotificationRepo>,
        profiles: Arc<dyn ProfileRepo>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            notifications,
            profiles,
            sink,
        }
    }

    /// Persist, then fan out best-effort.
    async fn deliver(&self, notification: Notification) -> Result<()> {
        self.notifications
            .insert_notification(notification.clone())
            .await?;
        if let Err(err) = self.sink.dispatch(&notification).await {
            warn!(
                recipient = %notification.recipient_id,
                kind = notification.kind.as_str(),
                error = %err,
                "notification dispatch failed, inbox record kept"
            );
        }
        Ok(())
    }

    /// One `audit_result` per moderation transition (non-report kinds).
    pub async fn notify_audit_result(
        &self,
        recipient_id: Uuid,
        decision: Decision,
        request_label: &str,
        request_id: Uuid,
    ) -> Result<()> {
        let (title, verb) = match decision {
            Decision::Approved => ("Request approved", "approved"),
            Decision::Rejected => ("Request rejected", "rejected"),
        };
        let notification = Notification::new(
            recipient_id,
            NotificationKind::AuditResult,
            title,
            format!("Your {request_label} request has been {verb}"),
        )
        .about("moderation_request", request_id);
        self.deliver(notification).await
    }

    /// One `report_feedback` per content-report transition, addressed to the
    /// reporter.
    pub async fn notify_report_feedback(
        &self,
        reporter_id: Uuid,
        decision: Decision,
        target_label: &str,
        report_id: Uuid,
    ) -> Result<()> {
        let (title, content) = match decision {
            Decision::Approved => (
                "Report handled",
                format!("Thanks for your report, the offending {target_label} has been dealt with"),
            ),
            Decision::Rejected => (
                "Report dismissed",
                format!(
                    "Thanks for your report, we reviewed the {target_label} and found no violation"
                ),
            ),
        };
        let notification = Notification::new(
            reporter_id,
            NotificationKind::ReportFeedback,
            title,
            content,
        )
        .about("moderation_request", report_id);
        self.deliver(notification).await
    }

    /// Like/comment ping to a content author.
    pub async fn notify_interaction(
        &self,
        recipient_id: Uuid,
        actor_name: &str,
        interaction: InteractionKind,
        target_label: &str,
        target_id: Uuid,
    ) -> Result<()> {
        let verb = match interaction {
            InteractionKind::Liked => "liked",
            InteractionKind::Commented => "commented on",
        };
        let text = format!("{actor_name} {verb} your {target_label}");
        let notification = Notification::new(
            recipient_id,
            NotificationKind::Interaction,
            text.clone(),
            text,
        )
        .about(target_label, target_id);
        self.deliver(notification).await
    }

    /// Superuser-only announcement fan-out: one `system_announcement` per
    /// profile matching `target_identities` (empty slice means everyone).
    /// Returns the number of inbox records written.
    pub async fn publish_announcement(
        &self,
        actor: &Viewer,
        title: &str,
        content: &str,
        target_identities: &[IdentityType],
    ) -> Result<usize> {
        if actor.role != Role::Superuser {
            return Err(AppError::unauthorized(
                "only a superuser may publish announcements",
            ));
        }
        if title.trim().is_empty() || content.trim().is_empty() {
            return Err(AppError::Validation(
                "announcement title and content must not be empty".into(),
            ));
        }

        let mut recipients: Vec<Uuid> = Vec::new();
        if target_identities.is_empty() {
            recipients = self.profiles.list_profile_ids(None).await?;
        } else {
            for identity in target_identities {
                recipients.extend(self.profiles.list_profile_ids(Some(*identity)).await?);
            }
        }
        recipients.sort_unstable();
        recipients.dedup();
        if recipients.is_empty() {
            return Err(AppError::Validation("no matching recipients".into()));
        }

        let notifications: Vec<Notification> = recipients
            .into_iter()
            .map(|recipient_id| {
                Notification::new(
                    recipient_id,
                    NotificationKind::SystemAnnouncement,
                    title,
                    content,
                )
            })
            .collect();
        let written = notifications.len();
        self.notifications
            .insert_notifications(notifications.clone())
            .await?;
        for notification in &notifications {
            if let Err(err) = self.sink.dispatch(notification).await {
                warn!(
                    recipient = %notification.recipient_id,
                    error = %err,
                    "announcement dispatch failed, inbox record kept"
                );
            }
        }
        Ok(written)
    }

    pub async fn unread(&self, user_id: Uuid) -> Result<Vec<Notification>> {
        Ok(self.notifications.list_unread(user_id).await?)
    }

    pub async fn list(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Notification>> {
        Ok(self
            .notifications
            .list_notifications(user_id, limit, offset)
            .await?)
    }

    /// Recipients manage their own inbox only. A foreign or unknown id gets
    /// the same `NotFound`, so an id is never confirmed to exist for anyone
    /// but its recipient.
    pub async fn mark_read(&self, notification_id: Uuid, user_id: Uuid) -> Result<()> {
        if self.notifications.mark_read(notification_id, user_id).await? {
            Ok(())
        } else {
            Err(AppError::not_found("Notification", notification_id))
        }
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        Ok(self.notifications.mark_all_read(user_id).await?)
    }

    pub async fn delete_notification(&self, notification_id: Uuid, user_id: Uuid) -> Result<()> {
        if self
            .notifications
            .delete_notification(notification_id, user_id)
            .await?
        {
            Ok(())
        } else {
            Err(AppError::not_found("Notification", notification_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{profile, viewer_for};
    use cw_store_memory::{FailingSink, MemoryStore, RecordingSink};

    fn service(store: Arc<MemoryStore>, sink: Arc<dyn NotificationSink>) -> InboxService {
        InboxService::new(store.clone(), store, sink)
    }

    #[tokio::test]
    async fn sink_failure_is_swallowed_and_inbox_record_kept() {
        let store = Arc::new(MemoryStore::new());
        let inbox = service(store.clone(), Arc::new(FailingSink));
        let recipient = Uuid::new_v4();

        inbox
            .notify_audit_result(recipient, Decision::Approved, "alumni upgrade", Uuid::new_v4())
            .await
            .expect("dispatch failure must not surface");

        let unread = inbox.unread(recipient).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind, NotificationKind::AuditResult);
    }

    #[tokio::test]
    async fn announcement_fans_out_to_matching_identities_only() {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(RecordingSink::new());
        let inbox = service(store.clone(), sink.clone());

        let su = profile("root", IdentityType::Classmate, Role::Superuser);
        let classmate = profile("c", IdentityType::Classmate, Role::User);
        let guest = profile("g", IdentityType::Guest, Role::User);
        for p in [&su, &classmate, &guest] {
            store.upsert_profile(p.clone()).await.unwrap();
        }

        let written = inbox
            .publish_announcement(
                &viewer_for(&su),
                "Reunion",
                "Saturday 3pm",
                &[IdentityType::Classmate],
            )
            .await
            .unwrap();

        assert_eq!(written, 2); // superuser is a classmate too
        assert_eq!(sink.dispatched_count(), 2);
        assert!(inbox.unread(guest.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn announcement_requires_superuser() {
        let store = Arc::new(MemoryStore::new());
        let inbox = service(store.clone(), Arc::new(RecordingSink::new()));
        let admin = profile("a", IdentityType::Classmate, Role::Admin);

        let err = inbox
            .publish_announcement(&viewer_for(&admin), "t", "c", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn mark_read_is_monotone() {
        let store = Arc::new(MemoryStore::new());
        let inbox = service(store.clone(), Arc::new(RecordingSink::new()));
        let recipient = Uuid::new_v4();
        inbox
            .notify_interaction(recipient, "li", InteractionKind::Liked, "post", Uuid::new_v4())
            .await
            .unwrap();

        let id = inbox.unread(recipient).await.unwrap()[0].id;
        inbox.mark_read(id, recipient).await.unwrap();
        inbox.mark_read(id, recipient).await.unwrap(); // no-op, not an error
        assert!(inbox.unread(recipient).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inbox_records_are_owned_by_their_recipient() {
        let store = Arc::new(MemoryStore::new());
        let inbox = service(store.clone(), Arc::new(RecordingSink::new()));
        let recipient = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        inbox
            .notify_interaction(recipient, "li", InteractionKind::Liked, "post", Uuid::new_v4())
            .await
            .unwrap();
        let id = inbox.unread(recipient).await.unwrap()[0].id;

        // A stranger holding the id can neither mark nor delete it, and the
        // error does not confirm the record exists.
        assert!(matches!(
            inbox.mark_read(id, stranger).await.unwrap_err(),
            AppError::NotFound(..)
        ));
        assert!(matches!(
            inbox.delete_notification(id, stranger).await.unwrap_err(),
            AppError::NotFound(..)
        ));
        assert_eq!(inbox.unread(recipient).await.unwrap().len(), 1);

        inbox.delete_notification(id, recipient).await.unwrap();
        assert!(inbox.unread(recipient).await.unwrap().is_empty());
    }
}
