//! # Comment Thread Model
//!
//! Parent/child linkage with orphan-safe deletion: removing a comment never
//! cascades to its replies. A reply whose parent is gone keeps its
//! `parent_id` and renders an "original comment deleted" label instead of
//! erroring.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cw_core::error::{AppError, Result};
use cw_core::models::{Comment, DisplayedAuthor, Post, Profile, Viewer};
use cw_core::traits::{CommentRepo, LikeRepo, PostRepo, ProfileRepo};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::cloak;
use crate::inbox::{InboxService, InteractionKind};
use crate::visibility;

/// Upper bound on comment length, in characters.
pub const COMMENT_CONTENT_MAX: usize = 500;

/// Characters of parent content quoted under a reply.
const REPLY_SNIPPET_LEN: usize = 20;

/// What a reply points at, resolved best-effort at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReplyTarget {
    /// Parent still exists; name is cloaked like any other author field.
    To { display_name: String, snippet: String },
    /// Parent was deleted; the reply stays, with a fallback label.
    OriginalDeleted,
}

/// A comment as exposed to one viewer. Carries no raw `author_id`.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub is_anonymous: bool,
    pub author: DisplayedAuthor,
    pub reply_to: Option<ReplyTarget>,
    pub like_count: i64,
    pub liked: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for a new comment.
#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub is_anonymous: bool,
}

pub struct CommentService {
    posts: Arc<dyn PostRepo>,
    comments: Arc<dyn CommentRepo>,
    likes: Arc<dyn LikeRepo>,
    profiles: Arc<dyn ProfileRepo>,
    inbox: Arc<InboxService>,
}

impl CommentService {
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

    pub async fn add_comment(
        &self,
        post_id: Uuid,
        viewer: &Viewer,
        input: NewComment,
    ) -> Result<CommentView> {
        let actor_id = visibility::require_actor(viewer)?;
        let post = self.load_post(post_id).await?;
        visibility::ensure_can_view(&post, viewer)?;

        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("comment content must not be empty".into()));
        }
        if content.chars().count() > COMMENT_CONTENT_MAX {
            return Err(AppError::Validation(format!(
                "comment content exceeds {COMMENT_CONTENT_MAX} characters"
            )));
        }

        // Parent must exist on the same post at write time; after that it
        // may disappear and the reply stands on its own.
        let parent = match input.parent_id {
            Some(parent_id) => {
                let parent = self
                    .comments
                    .get_comment(parent_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Validation("parent comment does not exist".into())
                    })?;
                if parent.post_id != post_id {
                    return Err(AppError::Validation(
                        "parent comment belongs to a different post".into(),
                    ));
                }
                Some(parent)
            }
            None => None,
        };

        let comment = Comment {
            id: Uuid::new_v4(),
            post_id,
            author_id: actor_id,
            content: content.to_string(),
            parent_id: input.parent_id,
            reply_to_user_id: parent.as_ref().map(|p| p.author_id),
            is_anonymous: input.is_anonymous,
            created_at: Utc::now(),
        };
        self.comments.insert_comment(comment.clone()).await?;

        if post.author_id != actor_id {
            self.ping_post_author(post.author_id, actor_id, post_id).await;
        }

        let profiles = self
            .load_profiles([Some(actor_id), parent.as_ref().map(|p| p.author_id)])
            .await?;
        Ok(self.shape(&comment, parent.as_ref(), &profiles, viewer, 0, false))
    }

    /// Comments of a post, oldest first. Fails with the same error as
    /// viewing the post itself when the viewer lacks access: a partial or
    /// empty result would reveal that the post exists.
    pub async fn list_comments(&self, post_id: Uuid, viewer: &Viewer) -> Result<Vec<CommentView>> {
        let post = self.load_post(post_id).await?;
        visibility::ensure_can_view(&post, viewer)?;

        let comments = self.comments.list_comments(post_id).await?;
        let by_id: HashMap<Uuid, &Comment> = comments.iter().map(|c| (c.id, c)).collect();
        let profiles = self
            .load_profiles(comments.iter().map(|c| Some(c.author_id)))
            .await?;

        let mut views = Vec::with_capacity(comments.len());
        for comment in &comments {
            let parent = comment.parent_id.and_then(|id| by_id.get(&id).copied());
            let like_count = self.likes.count_likes(comment.id).await?;
            let liked = match viewer.id {
                Some(viewer_id) => self.likes.contains(comment.id, viewer_id).await?,
                None => false,
            };
            views.push(self.shape(comment, parent, &profiles, viewer, like_count, liked));
        }
        Ok(views)
    }

    /// Author-only deletion. Moderator removal goes through the moderation
    /// workflow's report resolution, not here. Replies are left in place.
    pub async fn delete_comment(&self, comment_id: Uuid, viewer: &Viewer) -> Result<()> {
        let actor_id = visibility::require_actor(viewer)?;
        let comment = self
            .comments
            .get_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment", comment_id))?;
        if comment.author_id != actor_id {
            return Err(AppError::unauthorized("only the author may delete a comment"));
        }
        self.comments.delete_comment(comment_id).await?;
        Ok(())
    }

    async fn load_post(&self, post_id: Uuid) -> Result<Post> {
        self.posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post_id))
    }

    async fn load_profiles(
        &self,
        ids: impl IntoIterator<Item = Option<Uuid>>,
    ) -> Result<HashMap<Uuid, Profile>> {
        let mut out = HashMap::new();
        for id in ids.into_iter().flatten() {
            if !out.contains_key(&id) {
                if let Some(profile) = self.profiles.get_profile(id).await? {
                    out.insert(id, profile);
                }
            }
        }
        Ok(out)
    }

    fn shape(
        &self,
        comment: &Comment,
        parent: Option<&Comment>,
        profiles: &HashMap<Uuid, Profile>,
        viewer: &Viewer,
        like_count: i64,
        liked: bool,
    ) -> CommentView {
        let author = cloak::displayed_author(
            comment.author_id,
            profiles.get(&comment.author_id),
            comment.is_anonymous,
            viewer.role,
        );
        let reply_to = comment.parent_id.map(|_| match parent {
            Some(parent) => {
                let parent_author = cloak::displayed_author(
                    parent.author_id,
                    profiles.get(&parent.author_id),
                    parent.is_anonymous,
                    viewer.role,
                );
                ReplyTarget::To {
                    display_name: parent_author.display_name,
                    snippet: parent.content.chars().take(REPLY_SNIPPET_LEN).collect(),
                }
            }
            None => ReplyTarget::OriginalDeleted,
        });
        CommentView {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content.clone(),
            parent_id: comment.parent_id,
            is_anonymous: comment.is_anonymous,
            author,
            reply_to,
            like_count,
            liked,
            created_at: comment.created_at,
        }
    }

    async fn ping_post_author(&self, author_id: Uuid, actor_id: Uuid, post_id: Uuid) {
        let actor_name = match self.profiles.get_profile(actor_id).await {
            Ok(Some(p)) => p.nickname,
            _ => return,
        };
        if let Err(err) = self
            .inbox
            .notify_interaction(
                author_id,
                &actor_name,
                InteractionKind::Commented,
                "post",
                post_id,
            )
            .await
        {
            warn!(%author_id, error = %err, "comment notification failed");
        }
    }
}
