//! # Engagement Ledger
//!
//! Like membership (set semantics, idempotent toggle) and monotonic view
//! counters. The ledger returns the authoritative post-operation values;
//! optimistic client state reconciles against these, never the reverse.

use std::sync::Arc;

use cw_core::error::{AppError, Result};
use cw_core::models::Viewer;
use cw_core::traits::{CommentRepo, LikeRepo, PostRepo, ProfileRepo};
use tracing::warn;
use uuid::Uuid;

use crate::inbox::{InboxService, InteractionKind};
use crate::visibility;

/// Authoritative result of a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOutcome {
    pub liked: bool,
    pub like_count: i64,
}

pub struct EngagementService {
    posts: Arc<dyn PostRepo>,
    comments: Arc<dyn CommentRepo>,
    likes: Arc<dyn LikeRepo>,
    profiles: Arc<dyn ProfileRepo>,
    inbox: Arc<InboxService>,
}

impl EngagementService {
    pub fn new(
        posts: Arc<dyn PostRepo>,
        comments: Arc<dyn CommentRepo>,
        likes: Arc<dyn LikeRepo>,
        profiles: Arc<dyn ProfileRepo>,
        inbox: Arc<InboxService>,
    ) -> Self {
        Self {
            posts,
            comments,
            likes,
            profiles,
            inbox,
        }
    }

    /// Toggle the viewer's like on a post. Requires an authenticated viewer
    /// who can see the post.
    pub async fn toggle_post_like(&self, post_id: Uuid, viewer: &Viewer) -> Result<LikeOutcome> {
        let actor_id = visibility::require_actor(viewer)?;
        let post = self
            .posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post_id))?;
        visibility::ensure_can_view(&post, viewer)?;

        let outcome = self.toggle(post_id, actor_id).await?;
        if outcome.liked && post.author_id != actor_id {
            self.ping_author(post.author_id, actor_id, "post", post_id)
                .await;
        }
        Ok(outcome)
    }

    /// Toggle the viewer's like on a comment. Access follows the parent
    /// post's visibility.
    pub async fn toggle_comment_like(
        &self,
        comment_id: Uuid,
        viewer: &Viewer,
    ) -> Result<LikeOutcome> {
        let actor_id = visibility::require_actor(viewer)?;
        let comment = self
            .comments
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;
        let post = self
            .posts
            .get_post(comment.post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", comment.post_id))?;
        visibility::ensure_can_view(&post, viewer)?;

        let outcome = self.toggle(comment_id, actor_id).await?;
        if outcome.liked && comment.author_id != actor_id {
            self.ping_author(comment.author_id, actor_id, "comment", comment_id)
                .await;
        }
        Ok(outcome)
    }

    /// Insert-if-absent wins the toggle race: whichever of two concurrent
    /// calls inserts the row reports `liked = true`, the other observes the
    /// membership and removes it.
    async fn toggle(&self, item_id: Uuid, actor_id: Uuid) -> Result<LikeOutcome> {
        let liked = if self.likes.insert_if_absent(item_id, actor_id).await? {
            true
        } else {
            self.likes.delete_if_present(item_id, actor_id).await?;
            false
        };
        let like_count = self.likes.count_likes(item_id).await?;
        Ok(LikeOutcome { liked, like_count })
    }

    /// Best-effort interaction ping; never fails the toggle.
    async fn ping_author(&self, author_id: Uuid, actor_id: Uuid, label: &str, item_id: Uuid) {
        let actor_name = match self.profiles.get_profile(actor_id).await {
            Ok(Some(p)) => p.nickname,
            _ => return,
        };
        if let Err(err) = self
            .inbox
            .notify_interaction(author_id, &actor_name, InteractionKind::Liked, label, item_id)
            .await
        {
            warn!(%author_id, error = %err, "like notification failed");
        }
    }

    /// Count one detail-view event. The call site signals "first view of
    /// this visit"; this is a dumb increment-or-skip that only refuses to
    /// count the author inflating their own post. Returns the authoritative
    /// view count.
    pub async fn record_view(&self, post_id: Uuid, viewer_id: Option<Uuid>) -> Result<i64> {
        let post = self
            .posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post_id))?;
        if viewer_id == Some(post.author_id) {
            return Ok(post.view_count);
        }
        self.posts
            .increment_view_count(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post_id))
    }
}
