//! # Core Traits (Ports)
//!
//! Contracts for the external collaborators: the durable record store and
//! the notification fan-out. Any plugin must implement these traits to be
//! wired into the service layer.
//!
//! Uniqueness and conditional-update semantics live here on purpose: the
//! concurrency guarantees of like toggling and request finalization are a
//! storage-boundary concern, not an application check-then-act.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    AdminPermissions, Comment, IdentityType, ModerationRequest, Notification, Post, Profile,
    RequestPayload, RequestStatus, Role,
};

/// Account records.
#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> anyhow::Result<Option<Profile>>;
    /// Registration lives outside the core; this is the write path it uses.
    async fn upsert_profile(&self, profile: Profile) -> anyhow::Result<()>;
    async fn set_identity_type(&self, id: Uuid, identity: IdentityType) -> anyhow::Result<()>;
    async fn set_role(&self, id: Uuid, role: Role) -> anyhow::Result<()>;
    async fn set_banned(&self, id: Uuid, banned: bool) -> anyhow::Result<()>;
    /// Profile ids, optionally filtered by identity tier (announcement fan-out).
    async fn list_profile_ids(&self, identity: Option<IdentityType>) -> anyhow::Result<Vec<Uuid>>;
}

/// Wall posts.
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn insert_post(&self, post: Post) -> anyhow::Result<()>;
    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    /// Returns false if the post did not exist.
    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Atomic `view_count = view_count + 1`; returns the new count, or
    /// `None` if the post does not exist. Must never decrement.
    async fn increment_view_count(&self, id: Uuid) -> anyhow::Result<Option<i64>>;
    /// All posts, newest first. Visibility filtering is the caller's job.
    async fn list_posts(&self) -> anyhow::Result<Vec<Post>>;
}

/// Comments, linked to posts and optionally to a parent comment.
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn insert_comment(&self, comment: Comment) -> anyhow::Result<()>;
    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    /// Comments of a post, oldest first. Replies are neither cascaded nor
    /// renumbered when their parent disappears.
    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>>;
    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn count_comments(&self, post_id: Uuid) -> anyhow::Result<i64>;
}

/// Like membership, keyed `(item_id, user_id)` where the item is a post or
/// a comment. Existence = "liked"; cardinality = displayed like count.
#[async_trait]
pub trait LikeRepo: Send + Sync {
    /// Atomic insert-if-absent. Returns true if a row was inserted, false if
    /// the membership already existed (concurrent double-toggle safety).
    async fn insert_if_absent(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
    /// Returns true if a row was removed.
    async fn delete_if_present(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
    async fn contains(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;
    async fn count_likes(&self, item_id: Uuid) -> anyhow::Result<i64>;
}

/// Moderation requests of all four kinds.
#[async_trait]
pub trait RequestRepo: Send + Sync {
    async fn insert_request(&self, request: ModerationRequest) -> anyhow::Result<()>;
    async fn get_request(&self, id: Uuid) -> anyhow::Result<Option<ModerationRequest>>;
    /// Conditional terminal write: succeeds (returns true) only if the
    /// request is still `pending`. A concurrent loser observes false and
    /// must not re-apply effects. `payload` optionally replaces the stored
    /// payload in the same write (journal access window).
    async fn finalize_if_pending(
        &self,
        id: Uuid,
        status: RequestStatus,
        handled_by: Uuid,
        handled_at: DateTime<Utc>,
        admin_note: Option<String>,
        payload: Option<RequestPayload>,
    ) -> anyhow::Result<bool>;
    /// Compensation path: put a finalized request back to `pending` after a
    /// dependent profile/permission write failed.
    async fn reopen_request(&self, id: Uuid) -> anyhow::Result<()>;
    async fn list_requests(&self, status: Option<RequestStatus>)
        -> anyhow::Result<Vec<ModerationRequest>>;
    async fn list_requests_by_requester(
        &self,
        requester_id: Uuid,
    ) -> anyhow::Result<Vec<ModerationRequest>>;
}

/// Per-admin capability flags. Superusers have no record; their capabilities
/// are implied by role.
#[async_trait]
pub trait PermissionRepo: Send + Sync {
    async fn get_permissions(&self, admin_id: Uuid) -> anyhow::Result<Option<AdminPermissions>>;
    async fn upsert_permissions(
        &self,
        admin_id: Uuid,
        permissions: AdminPermissions,
    ) -> anyhow::Result<()>;
    async fn remove_permissions(&self, admin_id: Uuid) -> anyhow::Result<()>;
}

/// Inbox records.
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    async fn insert_notification(&self, notification: Notification) -> anyhow::Result<()>;
    async fn insert_notifications(&self, notifications: Vec<Notification>) -> anyhow::Result<()>;
    async fn list_unread(&self, recipient_id: Uuid) -> anyhow::Result<Vec<Notification>>;
    /// Newest first, paginated.
    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Notification>>;
    /// `is_read` transitions false -> true only; marking an already-read
    /// notification is a no-op. Returns false if the id does not exist or
    /// belongs to a different recipient.
    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> anyhow::Result<bool>;
    /// Returns the number of notifications flipped to read.
    async fn mark_all_read(&self, recipient_id: Uuid) -> anyhow::Result<u64>;
    /// Returns false if the id does not exist or belongs to a different
    /// recipient.
    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> anyhow::Result<bool>;
}

/// Best-effort delivery/realtime fan-out collaborator. Assumed to enqueue
/// rather than synchronously deliver; callers never block a state transition
/// on it and swallow its failures.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()>;
}
