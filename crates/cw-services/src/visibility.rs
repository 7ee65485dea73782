//! # Visibility Policy Evaluator
//!
//! The single precedence list deciding whether a viewer may see a post.
//! Every call site goes through here; new visibility rules are added to
//! this list, never re-implemented ad hoc. Comments have no visibility of
//! their own and inherit their parent post's tier.

use cw_core::error::{AppError, Result};
use cw_core::models::{IdentityType, Post, Viewer, Visibility};
use uuid::Uuid;

/// Precedence order:
/// 1. admins and superusers see everything, including others' private posts;
/// 2. `public` is open to all, authenticated or not;
/// 3. `alumni_only` requires alumni or classmate identity;
/// 4. `classmate_only` requires classmate identity;
/// 5. `private` requires being the author.
pub fn can_view(post: &Post, viewer: &Viewer) -> bool {
    if viewer.role.is_moderator() {
        return true;
    }
    match post.visibility {
        Visibility::Public => true,
        Visibility::AlumniOnly => matches!(
            viewer.identity_type,
            IdentityType::Alumni | IdentityType::Classmate
        ),
        Visibility::ClassmateOnly => viewer.identity_type == IdentityType::Classmate,
        Visibility::Private => viewer.id == Some(post.author_id),
    }
}

/// Same check as [`can_view`], surfaced as the uniform access error.
/// Listing a post's comments fails with this exact error too, so a denied
/// viewer cannot tell an invisible post from an empty one.
pub fn ensure_can_view(post: &Post, viewer: &Viewer) -> Result<()> {
    if can_view(post, viewer) {
        Ok(())
    } else {
        Err(AppError::unauthorized("post visibility denies viewer"))
    }
}

/// Resolves the acting user id for a mutating operation: the viewer must be
/// authenticated and not banned.
pub fn require_actor(viewer: &Viewer) -> Result<Uuid> {
    let id = viewer.id.ok_or(AppError::Unauthenticated)?;
    if viewer.is_banned {
        return Err(AppError::unauthorized("viewer is banned"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{post_with, viewer};
    use cw_core::models::Role;

    #[test]
    fn guest_sees_public_only() {
        let guest = viewer(Role::User, IdentityType::Guest);
        for vis in [
            Visibility::Public,
            Visibility::AlumniOnly,
            Visibility::ClassmateOnly,
            Visibility::Private,
        ] {
            let post = post_with(Uuid::new_v4(), vis, false);
            assert_eq!(can_view(&post, &guest), vis == Visibility::Public);
        }
    }

    #[test]
    fn moderators_see_everything_including_foreign_private() {
        for role in [Role::Admin, Role::Superuser] {
            let mod_viewer = viewer(role, IdentityType::Guest);
            let post = post_with(Uuid::new_v4(), Visibility::Private, false);
            assert!(can_view(&post, &mod_viewer));
        }
    }

    #[test]
    fn alumni_denied_classmate_only() {
        let alum = viewer(Role::User, IdentityType::Alumni);
        let post = post_with(Uuid::new_v4(), Visibility::ClassmateOnly, false);
        assert!(!can_view(&post, &alum));
        assert!(can_view(
            &post_with(Uuid::new_v4(), Visibility::AlumniOnly, false),
            &alum
        ));
    }

    #[test]
    fn private_post_visible_to_author_only() {
        let author_id = Uuid::new_v4();
        let post = post_with(author_id, Visibility::Private, false);

        let mut author = viewer(Role::User, IdentityType::Classmate);
        author.id = Some(author_id);
        assert!(can_view(&post, &author));

        let other = viewer(Role::User, IdentityType::Classmate);
        assert!(!can_view(&post, &other));
    }

    #[test]
    fn unauthenticated_viewer_never_matches_private_author() {
        let author_id = Uuid::new_v4();
        let post = post_with(author_id, Visibility::Private, false);
        assert!(!can_view(&post, &Viewer::anonymous()));
    }

    #[test]
    fn denial_is_a_generic_no_access_error() {
        let post = post_with(Uuid::new_v4(), Visibility::Private, false);
        let err = ensure_can_view(&post, &Viewer::anonymous()).unwrap_err();
        assert_eq!(err.to_string(), "no access");
    }

    #[test]
    fn require_actor_rejects_anonymous_and_banned() {
        assert!(matches!(
            require_actor(&Viewer::anonymous()),
            Err(AppError::Unauthenticated)
        ));

        let mut banned = viewer(Role::User, IdentityType::Classmate);
        banned.is_banned = true;
        assert!(matches!(
            require_actor(&banned),
            Err(AppError::Unauthorized { .. })
        ));
    }
}
