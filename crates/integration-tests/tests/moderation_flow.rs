//! Moderation lifecycle scenarios over the SQLite store: identity upgrades,
//! content reports with explicit removal, journal windows persisted through
//! the JSON payload column, and announcement fan-out.

use std::sync::Arc;

use chrono::Utc;
use cw_core::models::{
    AdminPermissions, Decision, IdentityType, NotificationKind, Profile, ReportTargetKind,
    RequestPayload, RequestStatus, Role, Viewer, Visibility,
};
use cw_core::traits::{NotificationRepo, PermissionRepo, ProfileRepo, RequestRepo};
use cw_services::inbox::InboxService;
use cw_services::moderation::ModerationService;
use cw_services::posts::{NewPost, PostService};
use cw_notify_log::LogSink;
use cw_store_sqlite::SqliteStore;
use uuid::Uuid;

struct Board {
    store: Arc<SqliteStore>,
    posts: PostService,
    moderation: ModerationService,
    inbox: Arc<InboxService>,
}

async fn board() -> Board {
    let store = Arc::new(SqliteStore::connect("sqlite::memory:").await.unwrap());
    let inbox = Arc::new(InboxService::new(
        store.clone(),
        store.clone(),
        Arc::new(LogSink::new()),
    ));
    Board {
        posts: PostService::new(store.clone(), store.clone(), store.clone(), store.clone()),
        moderation: ModerationService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            inbox.clone(),
        ),
        inbox,
        store,
    }
}

async fn member(
    store: &Arc<SqliteStore>,
    nickname: &str,
    identity: IdentityType,
    role: Role,
) -> Profile {
    let profile = Profile {
        id: Uuid::new_v4(),
        nickname: nickname.to_string(),
        avatar_url: None,
        identity_type: identity,
        role,
        is_banned: false,
        created_at: Utc::now(),
    };
    store.upsert_profile(profile.clone()).await.unwrap();
    profile
}

fn as_viewer(profile: &Profile) -> Viewer {
    Viewer {
        id: Some(profile.id),
        role: profile.role,
        identity_type: profile.identity_type,
        is_banned: profile.is_banned,
    }
}

#[tokio::test]
async fn upgrade_lifecycle_unlocks_alumni_content() {
    let board = board().await;
    let guest = member(&board.store, "visitor", IdentityType::Guest, Role::User).await;
    let admin = member(&board.store, "mod", IdentityType::Classmate, Role::Admin).await;
    board
        .store
        .upsert_permissions(admin.id, AdminPermissions::all())
        .await
        .unwrap();
    let alum = member(&board.store, "taro", IdentityType::Alumni, Role::User).await;

    board
        .posts
        .create_post(
            &as_viewer(&alum),
            NewPost {
                content: "alumni career night".into(),
                media_urls: vec![],
                visibility: Visibility::AlumniOnly,
                is_anonymous: false,
            },
        )
        .await
        .unwrap();

    // Invisible while still a guest.
    assert!(board.posts.list_posts(&as_viewer(&guest)).await.unwrap().is_empty());

    let request = board
        .moderation
        .submit_identity_upgrade(&as_viewer(&guest), "class of 2011, lost my diploma")
        .await
        .unwrap();
    board
        .moderation
        .decide(request.id, admin.id, Decision::Approved, Some("verified".into()))
        .await
        .unwrap();

    let upgraded = board.store.get_profile(guest.id).await.unwrap().unwrap();
    assert_eq!(upgraded.identity_type, IdentityType::Alumni);

    let feed = board.posts.list_posts(&as_viewer(&upgraded)).await.unwrap();
    assert_eq!(feed.len(), 1);

    let inbox = board.store.list_unread(guest.id).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::AuditResult);
    assert!(inbox[0].content.contains("approved"));
}

#[tokio::test]
async fn report_lifecycle_removes_content_and_feeds_back() {
    let board = board().await;
    let author = member(&board.store, "li", IdentityType::Classmate, Role::User).await;
    let reporter = member(&board.store, "mei", IdentityType::Classmate, Role::User).await;
    let admin = member(&board.store, "mod", IdentityType::Classmate, Role::Admin).await;
    board
        .store
        .upsert_permissions(
            admin.id,
            AdminPermissions { can_manage_content: true, ..Default::default() },
        )
        .await
        .unwrap();

    let post = board
        .posts
        .create_post(
            &as_viewer(&author),
            NewPost {
                content: "buy cheap watches at spam.example".into(),
                media_urls: vec![],
                visibility: Visibility::Public,
                is_anonymous: false,
            },
        )
        .await
        .unwrap();

    let report = board
        .moderation
        .submit_content_report(
            &as_viewer(&reporter),
            ReportTargetKind::Post,
            post.id,
            "spam",
            Some("please remove".into()),
        )
        .await
        .unwrap();

    board.moderation.delete_reported_content(report.id, admin.id).await.unwrap();
    board
        .moderation
        .decide(report.id, admin.id, Decision::Approved, None)
        .await
        .unwrap();

    // The post is gone but the report keeps its excerpt for the record.
    assert!(board.posts.list_posts(&as_viewer(&reporter)).await.unwrap().is_empty());
    let stored = board.store.get_request(report.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Approved);
    match stored.payload {
        RequestPayload::ContentReport { target_excerpt, .. } => {
            assert!(target_excerpt.contains("cheap watches"));
        }
        other => panic!("unexpected payload: {other:?}"),
    }

    let inbox = board.store.list_unread(reporter.id).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::ReportFeedback);
}

#[tokio::test]
async fn journal_window_survives_the_payload_column() {
    let board = board().await;
    let alum = member(&board.store, "taro", IdentityType::Alumni, Role::User).await;
    let su = member(&board.store, "root", IdentityType::Classmate, Role::Superuser).await;

    let request = board
        .moderation
        .submit_journal_access(&as_viewer(&alum), 30)
        .await
        .unwrap();
    board
        .moderation
        .decide(request.id, su.id, Decision::Approved, None)
        .await
        .unwrap();

    let stored = board.store.get_request(request.id).await.unwrap().unwrap();
    match stored.payload {
        RequestPayload::JournalAccess { requested_days, access_start, access_end } => {
            assert_eq!(requested_days, 30);
            let start = access_start.unwrap();
            let end = access_end.unwrap();
            assert_eq!((end - start).num_days(), 30);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn announcement_reaches_every_classmate_inbox() {
    let board = board().await;
    let su = member(&board.store, "root", IdentityType::Classmate, Role::Superuser).await;
    let classmate = member(&board.store, "mei", IdentityType::Classmate, Role::User).await;
    let guest = member(&board.store, "visitor", IdentityType::Guest, Role::User).await;

    let written = board
        .inbox
        .publish_announcement(
            &as_viewer(&su),
            "Reunion",
            "Saturday 3pm in the old gym",
            &[IdentityType::Classmate],
        )
        .await
        .unwrap();
    assert_eq!(written, 2);

    assert!(board.store.list_unread(guest.id).await.unwrap().is_empty());
    let unread = board.store.list_unread(classmate.id).await.unwrap();
    assert_eq!(unread.len(), 1);
    assert_eq!(unread[0].kind, NotificationKind::SystemAnnouncement);

    assert_eq!(board.inbox.mark_all_read(classmate.id).await.unwrap(), 1);
    assert!(board.store.list_unread(classmate.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn ban_hides_nothing_but_blocks_the_actor() {
    let board = board().await;
    let su = member(&board.store, "root", IdentityType::Classmate, Role::Superuser).await;
    let rowdy = member(&board.store, "rowdy", IdentityType::Classmate, Role::User).await;

    board.moderation.ban_user(rowdy.id, su.id).await.unwrap();

    let banned = board.store.get_profile(rowdy.id).await.unwrap().unwrap();
    assert!(banned.is_banned);
    let err = board
        .posts
        .create_post(
            &as_viewer(&banned),
            NewPost {
                content: "still here".into(),
                media_urls: vec![],
                visibility: Visibility::Public,
                is_anonymous: false,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "no access");

    board.moderation.unban_user(rowdy.id, su.id).await.unwrap();
    let restored = board.store.get_profile(rowdy.id).await.unwrap().unwrap();
    board.posts.create_post(
        &as_viewer(&restored),
        NewPost {
            content: "back again".into(),
            media_urls: vec![],
            visibility: Visibility::Public,
            is_anonymous: false,
        },
    )
    .await
    .unwrap();
}
