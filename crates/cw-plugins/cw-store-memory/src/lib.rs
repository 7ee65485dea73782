//! # cw-store-memory
//!
//! In-process implementation of every storage port, backed by `DashMap`.
//! Single-entry map operations give the same atomicity the durable store
//! provides with constraints and conditional updates, which makes this the
//! reference store for the service-layer test suite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use cw_core::models::{
    AdminPermissions, Comment, IdentityType, ModerationRequest, Notification, Post, Profile,
    RequestPayload, RequestStatus, Role,
};
use cw_core::traits::{
    CommentRepo, LikeRepo, NotificationRepo, NotificationSink, PermissionRepo, PostRepo,
    ProfileRepo, RequestRepo,
};

/// One store instance implements all repo ports; services share it via `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    profiles: DashMap<Uuid, Profile>,
    posts: DashMap<Uuid, Post>,
    comments: DashMap<Uuid, Comment>,
    likes: DashMap<(Uuid, Uuid), ()>,
    requests: DashMap<Uuid, ModerationRequest>,
    permissions: DashMap<Uuid, AdminPermissions>,
    notifications: DashMap<Uuid, Notification>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepo for MemoryStore {
    async fn get_profile(&self, id: Uuid) -> anyhow::Result<Option<Profile>> {
        Ok(self.profiles.get(&id).map(|p| p.clone()))
    }

    async fn upsert_profile(&self, profile: Profile) -> anyhow::Result<()> {
        self.profiles.insert(profile.id, profile);
        Ok(())
    }

    async fn set_identity_type(&self, id: Uuid, identity: IdentityType) -> anyhow::Result<()> {
        match self.profiles.get_mut(&id) {
            Some(mut p) => {
                p.identity_type = identity;
                Ok(())
            }
            None => anyhow::bail!("profile {id} not found"),
        }
    }

    async fn set_role(&self, id: Uuid, role: Role) -> anyhow::Result<()> {
        match self.profiles.get_mut(&id) {
            Some(mut p) => {
                p.role = role;
                Ok(())
            }
            None => anyhow::bail!("profile {id} not found"),
        }
    }

    async fn set_banned(&self, id: Uuid, banned: bool) -> anyhow::Result<()> {
        match self.profiles.get_mut(&id) {
            Some(mut p) => {
                p.is_banned = banned;
                Ok(())
            }
            None => anyhow::bail!("profile {id} not found"),
        }
    }

    async fn list_profile_ids(&self, identity: Option<IdentityType>) -> anyhow::Result<Vec<Uuid>> {
        Ok(self
            .profiles
            .iter()
            .filter(|p| identity.map_or(true, |i| p.identity_type == i))
            .map(|p| p.id)
            .collect())
    }
}

#[async_trait]
impl PostRepo for MemoryStore {
    async fn insert_post(&self, post: Post) -> anyhow::Result<()> {
        self.posts.insert(post.id, post);
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        Ok(self.posts.get(&id).map(|p| p.clone()))
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.posts.remove(&id).is_some())
    }

    async fn increment_view_count(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        // get_mut holds the entry lock, so concurrent increments serialize.
        Ok(self.posts.get_mut(&id).map(|mut p| {
            p.view_count += 1;
            p.view_count
        }))
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let mut posts: Vec<Post> = self.posts.iter().map(|p| p.clone()).collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }
}

#[async_trait]
impl CommentRepo for MemoryStore {
    async fn insert_comment(&self, comment: Comment) -> anyhow::Result<()> {
        self.comments.insert(comment.id, comment);
        Ok(())
    }

    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        Ok(self.comments.get(&id).map(|c| c.clone()))
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.clone())
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(self.comments.remove(&id).is_some())
    }

    async fn count_comments(&self, post_id: Uuid) -> anyhow::Result<i64> {
        Ok(self.comments.iter().filter(|c| c.post_id == post_id).count() as i64)
    }
}

#[async_trait]
impl LikeRepo for MemoryStore {
    async fn insert_if_absent(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        // insert returns the previous value; None means this call won the row.
        Ok(self.likes.insert((item_id, user_id), ()).is_none())
    }

    async fn delete_if_present(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.likes.remove(&(item_id, user_id)).is_some())
    }

    async fn contains(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.likes.contains_key(&(item_id, user_id)))
    }

    async fn count_likes(&self, item_id: Uuid) -> anyhow::Result<i64> {
        Ok(self.likes.iter().filter(|e| e.key().0 == item_id).count() as i64)
    }
}

#[async_trait]
impl RequestRepo for MemoryStore {
    async fn insert_request(&self, request: ModerationRequest) -> anyhow::Result<()> {
        self.requests.insert(request.id, request);
        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> anyhow::Result<Option<ModerationRequest>> {
        Ok(self.requests.get(&id).map(|r| r.clone()))
    }

    async fn finalize_if_pending(
        &self,
        id: Uuid,
        status: RequestStatus,
        handled_by: Uuid,
        handled_at: DateTime<Utc>,
        admin_note: Option<String>,
        payload: Option<RequestPayload>,
    ) -> anyhow::Result<bool> {
        let mut entry = match self.requests.get_mut(&id) {
            Some(entry) => entry,
            None => anyhow::bail!("moderation request {id} not found"),
        };
        // Pending check and write happen under the same entry lock, so a
        // concurrent decide() loser observes false here.
        if entry.status != RequestStatus::Pending {
            return Ok(false);
        }
        entry.status = status;
        entry.handled_by = Some(handled_by);
        entry.handled_at = Some(handled_at);
        entry.admin_note = admin_note;
        if let Some(payload) = payload {
            entry.payload = payload;
        }
        Ok(true)
    }

    async fn reopen_request(&self, id: Uuid) -> anyhow::Result<()> {
        match self.requests.get_mut(&id) {
            Some(mut entry) => {
                entry.status = RequestStatus::Pending;
                entry.handled_by = None;
                entry.handled_at = None;
                entry.admin_note = None;
                Ok(())
            }
            None => anyhow::bail!("moderation request {id} not found"),
        }
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> anyhow::Result<Vec<ModerationRequest>> {
        let mut requests: Vec<ModerationRequest> = self
            .requests
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .map(|r| r.clone())
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn list_requests_by_requester(
        &self,
        requester_id: Uuid,
    ) -> anyhow::Result<Vec<ModerationRequest>> {
        let mut requests: Vec<ModerationRequest> = self
            .requests
            .iter()
            .filter(|r| r.requester_id == requester_id)
            .map(|r| r.clone())
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}

#[async_trait]
impl PermissionRepo for MemoryStore {
    async fn get_permissions(&self, admin_id: Uuid) -> anyhow::Result<Option<AdminPermissions>> {
        Ok(self.permissions.get(&admin_id).map(|p| *p))
    }

    async fn upsert_permissions(
        &self,
        admin_id: Uuid,
        permissions: AdminPermissions,
    ) -> anyhow::Result<()> {
        self.permissions.insert(admin_id, permissions);
        Ok(())
    }

    async fn remove_permissions(&self, admin_id: Uuid) -> anyhow::Result<()> {
        self.permissions.remove(&admin_id);
        Ok(())
    }
}

#[async_trait]
impl NotificationRepo for MemoryStore {
    async fn insert_notification(&self, notification: Notification) -> anyhow::Result<()> {
        self.notifications.insert(notification.id, notification);
        Ok(())
    }

    async fn insert_notifications(&self, notifications: Vec<Notification>) -> anyhow::Result<()> {
        for n in notifications {
            self.notifications.insert(n.id, n);
        }
        Ok(())
    }

    async fn list_unread(&self, recipient_id: Uuid) -> anyhow::Result<Vec<Notification>> {
        let mut unread: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id && !n.is_read)
            .map(|n| n.clone())
            .collect();
        unread.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(unread)
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Notification>> {
        let mut all: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .map(|n| n.clone())
            .collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> anyhow::Result<bool> {
        match self.notifications.get_mut(&id) {
            Some(mut n) if n.recipient_id == recipient_id => {
                // false -> true only; already-read is a no-op, never a revert.
                n.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> anyhow::Result<u64> {
        let mut flipped = 0;
        for mut n in self.notifications.iter_mut() {
            if n.recipient_id == recipient_id && !n.is_read {
                n.is_read = true;
                flipped += 1;
            }
        }
        Ok(flipped)
    }

    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> anyhow::Result<bool> {
        Ok(self
            .notifications
            .remove_if(&id, |_, n| n.recipient_id == recipient_id)
            .is_some())
    }
}

/// Test double for the realtime fan-out: remembers everything dispatched.
#[derive(Default)]
pub struct RecordingSink {
    dispatched: DashMap<Uuid, Notification>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched_count(&self) -> usize {
        self.dispatched.len()
    }

    pub fn dispatched_for(&self, recipient_id: Uuid) -> Vec<Notification> {
        self.dispatched
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .map(|n| n.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn dispatch(&self, notification: &Notification) -> anyhow::Result<()> {
        self.dispatched.insert(notification.id, notification.clone());
        Ok(())
    }
}

/// Sink that always fails; used to verify that dispatch failures are
/// swallowed and never fail the primary operation.
pub struct FailingSink;

#[async_trait]
impl NotificationSink for FailingSink {
    async fn dispatch(&self, _notification: &Notification) -> anyhow::Result<()> {
        anyhow::bail!("fan-out collaborator unavailable")
    }
}
