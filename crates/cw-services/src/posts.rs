//! # Post Service
//!
//! Creation, reading, and listing of wall posts: the point where the
//! visibility evaluator, the cloak, and the engagement-derived counters meet.
//! View counting itself stays in the engagement ledger; the detail-view call
//! site decides when a view event fires.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cw_core::error::{AppError, Result};
use cw_core::models::{DisplayedAuthor, IdentityType, Post, Profile, Viewer, Visibility};
use cw_core::traits::{CommentRepo, LikeRepo, PostRepo, ProfileRepo};
use serde::Serialize;
use uuid::Uuid;

use crate::cloak;
use crate::visibility;

/// Upper bound on post length, in characters.
pub const POST_CONTENT_MAX: usize = 2000;

/// Media attachments per post.
pub const MEDIA_MAX: usize = 5;

/// A post as exposed to one viewer. No raw `author_id`: authorship travels
/// only through the cloaked [`DisplayedAuthor`].
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub content: String,
    pub media_urls: Vec<String>,
    pub visibility: Visibility,
    pub is_anonymous: bool,
    pub author: DisplayedAuthor,
    pub like_count: i64,
    pub comment_count: i64,
    pub view_count: i64,
    pub liked: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for a new post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub content: String,
    pub media_urls: Vec<String>,
    pub visibility: Visibility,
    pub is_anonymous: bool,
}

pub struct PostService {
    posts: Arc<dyn PostRepo>,
    comments: Arc<dyn CommentRepo>,
    likes: Arc<dyn LikeRepo>,
    profiles: Arc<dyn ProfileRepo>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepo>,
        comments: Arc<dyn CommentRepo>,
        likes: Arc<dyn LikeRepo>,
        profiles: Arc<dyn ProfileRepo>,
    ) -> Self {
        Self {
            posts,
            comments,
            likes,
            profiles,
        }
    }

    /// Publishing is for classmates, alumni, and moderators; guests are told
    /// to request an upgrade first.
    pub async fn create_post(&self, viewer: &Viewer, input: NewPost) -> Result<PostView> {
        let actor_id = visibility::require_actor(viewer)?;
        let may_publish = viewer.role.is_moderator()
            || matches!(
                viewer.identity_type,
                IdentityType::Classmate | IdentityType::Alumni
            );
        if !may_publish {
            return Err(AppError::unauthorized("guests cannot publish posts"));
        }

        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation("post content must not be empty".into()));
        }
        if content.chars().count() > POST_CONTENT_MAX {
            return Err(AppError::Validation(format!(
                "post content exceeds {POST_CONTENT_MAX} characters"
            )));
        }
        validate_media(&input.media_urls)?;

        let post = Post {
            id: Uuid::new_v4(),
            author_id: actor_id,
            content: content.to_string(),
            media_urls: input.media_urls,
            visibility: input.visibility,
            is_anonymous: input.is_anonymous,
            view_count: 0,
            created_at: Utc::now(),
        };
        self.posts.insert_post(post.clone()).await?;

        // The creator's own echo is cloaked by the same rule as any reader:
        // an anonymous post shows the placeholder unless the viewer moderates.
        let profiles = self.load_profiles([post.author_id]).await?;
        Ok(self.shape(&post, &profiles, viewer, 0, 0, false))
    }

    /// One post, gated and cloaked for the viewer. Does not count a view;
    /// the call site fires `EngagementService::record_view` on first entry
    /// into the detail view.
    pub async fn get_post(&self, post_id: Uuid, viewer: &Viewer) -> Result<PostView> {
        let post = self
            .posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post_id))?;
        visibility::ensure_can_view(&post, viewer)?;

        let profiles = self.load_profiles([post.author_id]).await?;
        let like_count = self.likes.count_likes(post.id).await?;
        let comment_count = self.comments.count_comments(post.id).await?;
        let liked = match viewer.id {
            Some(viewer_id) => self.likes.contains(post.id, viewer_id).await?,
            None => false,
        };
        Ok(self.shape(&post, &profiles, viewer, like_count, comment_count, liked))
    }

    /// The wall feed: every post the viewer may see, newest first.
    pub async fn list_posts(&self, viewer: &Viewer) -> Result<Vec<PostView>> {
        let posts = self.posts.list_posts().await?;
        let visible: Vec<Post> = posts
            .into_iter()
            .filter(|p| visibility::can_view(p, viewer))
            .collect();
        let profiles = self
            .load_profiles(visible.iter().map(|p| p.author_id))
            .await?;

        let mut views = Vec::with_capacity(visible.len());
        for post in &visible {
            let like_count = self.likes.count_likes(post.id).await?;
            let comment_count = self.comments.count_comments(post.id).await?;
            let liked = match viewer.id {
                Some(viewer_id) => self.likes.contains(post.id, viewer_id).await?,
                None => false,
            };
            views.push(self.shape(post, &profiles, viewer, like_count, comment_count, liked));
        }
        Ok(views)
    }

    /// Author-only deletion; moderator removal goes through the moderation
    /// workflow's report resolution.
    pub async fn delete_post(&self, post_id: Uuid, viewer: &Viewer) -> Result<()> {
        let actor_id = visibility::require_actor(viewer)?;
        let post = self
            .posts
            .get_post(post_id)
            .await?
            .ok_or_else(|| AppError::not_found("Post", post_id))?;
        if post.author_id != actor_id {
            return Err(AppError::unauthorized("only the author may delete a post"));
        }
        self.posts.delete_post(post_id).await?;
        Ok(())
    }

    async fn load_profiles(
        &self,
        ids: impl IntoIterator<Item = Uuid>,
    ) -> Result<HashMap<Uuid, Profile>> {
        let mut out = HashMap::new();
        for id in ids {
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
        post: &Post,
        profiles: &HashMap<Uuid, Profile>,
        viewer: &Viewer,
        like_count: i64,
        comment_count: i64,
        liked: bool,
    ) -> PostView {
        PostView {
            id: post.id,
            content: post.content.clone(),
            media_urls: post.media_urls.clone(),
            visibility: post.visibility,
            is_anonymous: post.is_anonymous,
            author: cloak::displayed_author(
                post.author_id,
                profiles.get(&post.author_id),
                post.is_anonymous,
                viewer.role,
            ),
            like_count,
            comment_count,
            view_count: post.view_count,
            liked,
            created_at: post.created_at,
        }
    }
}

/// The core never touches media bytes; it only checks that refs look like
/// web URLs and stay within the per-post cap.
fn validate_media(urls: &[String]) -> Result<()> {
    if urls.len() > MEDIA_MAX {
        return Err(AppError::Validation(format!(
            "at most {MEDIA_MAX} media items per post"
        )));
    }
    for url in urls {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(AppError::Validation(format!(
                "media URL must be http or https: {url}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{post_with, profile, viewer_for};
    use cw_core::models::Role;
    use cw_store_memory::MemoryStore;

    fn service(store: &Arc<MemoryStore>) -> PostService {
        PostService::new(store.clone(), store.clone(), store.clone(), store.clone())
    }

    fn plain_input(content: &str) -> NewPost {
        NewPost {
            content: content.into(),
            media_urls: vec![],
            visibility: Visibility::Public,
            is_anonymous: false,
        }
    }

    #[tokio::test]
    async fn guests_cannot_publish() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let guest = profile("g", IdentityType::Guest, Role::User);
        store.upsert_profile(guest.clone()).await.unwrap();

        let err = svc
            .create_post(&viewer_for(&guest), plain_input("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn banned_users_cannot_publish() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let mut banned = profile("b", IdentityType::Classmate, Role::User);
        banned.is_banned = true;
        store.upsert_profile(banned.clone()).await.unwrap();

        let err = svc
            .create_post(&viewer_for(&banned), plain_input("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[tokio::test]
    async fn media_refs_are_validated() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = profile("a", IdentityType::Classmate, Role::User);
        store.upsert_profile(author.clone()).await.unwrap();

        let mut too_many = plain_input("pics");
        too_many.media_urls = (0..6).map(|i| format!("https://cdn.example/{i}")).collect();
        assert!(matches!(
            svc.create_post(&viewer_for(&author), too_many).await.unwrap_err(),
            AppError::Validation(_)
        ));

        let mut bad_scheme = plain_input("pic");
        bad_scheme.media_urls = vec!["ftp://cdn.example/x".into()];
        assert!(matches!(
            svc.create_post(&viewer_for(&author), bad_scheme).await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn anonymous_post_echo_is_cloaked_for_plain_creator() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = profile("shy", IdentityType::Classmate, Role::User);
        store.upsert_profile(author.clone()).await.unwrap();

        let mut input = plain_input("my secret take");
        input.is_anonymous = true;
        let view = svc.create_post(&viewer_for(&author), input).await.unwrap();

        assert_eq!(view.author.id, None);
        assert_eq!(view.author.display_name, cloak::ANONYMOUS_DISPLAY_NAME);
    }

    #[tokio::test]
    async fn feed_is_filtered_by_viewer_identity() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = profile("a", IdentityType::Classmate, Role::User);
        store.upsert_profile(author.clone()).await.unwrap();
        for vis in [
            Visibility::Public,
            Visibility::AlumniOnly,
            Visibility::ClassmateOnly,
            Visibility::Private,
        ] {
            store.insert_post(post_with(author.id, vis, false)).await.unwrap();
        }

        let alum = profile("al", IdentityType::Alumni, Role::User);
        let feed = svc.list_posts(&viewer_for(&alum)).await.unwrap();
        assert_eq!(feed.len(), 2);

        // The author also sees their own private post.
        let own = svc.list_posts(&viewer_for(&author)).await.unwrap();
        assert_eq!(own.len(), 4);

        let admin = profile("adm", IdentityType::Guest, Role::Admin);
        let all = svc.list_posts(&viewer_for(&admin)).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn anonymous_author_never_leaks_in_the_feed() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = profile("shy", IdentityType::Classmate, Role::User);
        store.upsert_profile(author.clone()).await.unwrap();
        store
            .insert_post(post_with(author.id, Visibility::Public, true))
            .await
            .unwrap();

        let reader = profile("r", IdentityType::Classmate, Role::User);
        let feed = svc.list_posts(&viewer_for(&reader)).await.unwrap();
        assert_eq!(feed[0].author.id, None);
        assert_ne!(feed[0].author.display_name, "shy");

        let admin = profile("adm", IdentityType::Guest, Role::Admin);
        let feed = svc.list_posts(&viewer_for(&admin)).await.unwrap();
        assert_eq!(feed[0].author.id, Some(author.id));
        assert!(feed[0].author.is_real_author_visible);
    }

    #[tokio::test]
    async fn get_post_denies_with_generic_error() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let post = post_with(Uuid::new_v4(), Visibility::Private, false);
        let post_id = post.id;
        store.insert_post(post).await.unwrap();

        let reader = profile("r", IdentityType::Classmate, Role::User);
        let err = svc.get_post(post_id, &viewer_for(&reader)).await.unwrap_err();
        assert_eq!(err.to_string(), "no access");
    }

    #[tokio::test]
    async fn delete_post_is_author_only() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(&store);
        let author = profile("a", IdentityType::Classmate, Role::User);
        let other = profile("o", IdentityType::Classmate, Role::User);
        let post = post_with(author.id, Visibility::Public, false);
        let post_id = post.id;
        store.insert_post(post).await.unwrap();

        assert!(matches!(
            svc.delete_post(post_id, &viewer_for(&other)).await.unwrap_err(),
            AppError::Unauthorized { .. }
        ));
        svc.delete_post(post_id, &viewer_for(&author)).await.unwrap();
        assert!(store.get_post(post_id).await.unwrap().is_none());
    }
}
