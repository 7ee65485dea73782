//! Shared fixtures for the service-layer tests.

use chrono::Utc;
use cw_core::models::{
    Comment, IdentityType, Post, Profile, Role, Viewer, Visibility,
};
use uuid::Uuid;

pub fn viewer(role: Role, identity: IdentityType) -> Viewer {
    Viewer {
        id: Some(Uuid::new_v4()),
        role,
        identity_type: identity,
        is_banned: false,
    }
}

pub fn viewer_for(profile: &Profile) -> Viewer {
    Viewer {
        id: Some(profile.id),
        role: profile.role,
        identity_type: profile.identity_type,
        is_banned: profile.is_banned,
    }
}

pub fn profile(nickname: &str, identity: IdentityType, role: Role) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        nickname: nickname.to_string(),
        avatar_url: None,
        identity_type: identity,
        role,
        is_banned: false,
        created_at: Utc::now(),
    }
}

pub fn post_with(author_id: Uuid, visibility: Visibility, is_anonymous: bool) -> Post {
    Post {
        id: Uuid::new_v4(),
        author_id,
        content: "reunion photos from saturday".to_string(),
        media_urls: vec![],
        visibility,
        is_anonymous,
        view_count: 0,
        created_at: Utc::now(),
    }
}

pub fn comment_on(post_id: Uuid, author_id: Uuid, content: &str) -> Comment {
    Comment {
        id: Uuid::new_v4(),
        post_id,
        author_id,
        content: content.to_string(),
        parent_id: None,
        reply_to_user_id: None,
        is_anonymous: false,
        created_at: Utc::now(),
    }
}
