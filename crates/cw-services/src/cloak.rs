//! # Anonymity Cloak
//!
//! Shapes the author field of outbound content. For anonymous items the raw
//! author id must not reach a non-privileged viewer in any form; view types
//! therefore carry a [`DisplayedAuthor`] and no `author_id` at all.

use cw_core::models::{DisplayedAuthor, Profile, Role};
use uuid::Uuid;

/// Placeholder name shown to non-privileged viewers of anonymous content.
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous";

/// Name shown when the author's account no longer exists.
pub const UNKNOWN_DISPLAY_NAME: &str = "Unknown user";

/// The fixed placeholder identity: no id, no avatar.
pub fn placeholder_author() -> DisplayedAuthor {
    DisplayedAuthor {
        id: None,
        display_name: ANONYMOUS_DISPLAY_NAME.to_string(),
        avatar_url: None,
        is_real_author_visible: false,
    }
}

/// Resolves the author field shown to `viewer_role`.
///
/// Moderators always see the real author, tagged visible, so anonymous
/// content stays accountable. Everyone else gets the placeholder when the
/// item is anonymous. `profile` is `None` when the author account was
/// deleted; the item then displays a fallback name with the id retained.
pub fn displayed_author(
    author_id: Uuid,
    profile: Option<&Profile>,
    is_anonymous: bool,
    viewer_role: Role,
) -> DisplayedAuthor {
    if is_anonymous && !viewer_role.is_moderator() {
        return placeholder_author();
    }
    DisplayedAuthor {
        id: Some(author_id),
        display_name: profile
            .map(|p| p.nickname.clone())
            .unwrap_or_else(|| UNKNOWN_DISPLAY_NAME.to_string()),
        avatar_url: profile.and_then(|p| p.avatar_url.clone()),
        is_real_author_visible: is_anonymous,
    }
}
