//! # cw-store-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `cw-core` domain models.
//!
//! UUIDs are stored as 16-byte BLOBs, enums as their snake_case TEXT form,
//! and the kind-specific request payload as one JSON TEXT column. The
//! concurrency contracts of the ports are discharged with SQL itself:
//! `INSERT OR IGNORE` for like membership, `UPDATE .. WHERE status =
//! 'pending'` for request finalization, `view_count = view_count + 1
//! RETURNING` for the view counter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cw_core::models::{
    AdminPermissions, Comment, IdentityType, ModerationRequest, Notification, NotificationKind,
    Post, Profile, RequestPayload, RequestStatus, Role, Visibility,
};
use cw_core::traits::{
    CommentRepo, LikeRepo, NotificationRepo, PermissionRepo, PostRepo, ProfileRepo, RequestRepo,
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

pub struct SqliteStore {
    pool: SqlitePool,
}

// One statement per entry; sqlx executes single statements only.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS profiles (
        id BLOB PRIMARY KEY,
        nickname TEXT NOT NULL,
        avatar_url TEXT,
        identity_type TEXT NOT NULL,
        role TEXT NOT NULL,
        is_banned INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id BLOB PRIMARY KEY,
        author_id BLOB NOT NULL,
        content TEXT NOT NULL,
        media_urls TEXT NOT NULL DEFAULT '[]',
        visibility TEXT NOT NULL,
        is_anonymous INTEGER NOT NULL DEFAULT 0,
        view_count INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    // No FK cascade from comments to their parent: replies of a deleted
    // parent stay and render a fallback label.
    "CREATE TABLE IF NOT EXISTS comments (
        id BLOB PRIMARY KEY,
        post_id BLOB NOT NULL,
        author_id BLOB NOT NULL,
        content TEXT NOT NULL,
        parent_id BLOB,
        reply_to_user_id BLOB,
        is_anonymous INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id, created_at)",
    "CREATE TABLE IF NOT EXISTS likes (
        item_id BLOB NOT NULL,
        user_id BLOB NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (item_id, user_id)
    )",
    "CREATE TABLE IF NOT EXISTS moderation_requests (
        id BLOB PRIMARY KEY,
        requester_id BLOB NOT NULL,
        payload TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        handled_by BLOB,
        handled_at TEXT,
        admin_note TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_requests_status ON moderation_requests(status, created_at)",
    "CREATE TABLE IF NOT EXISTS admin_permissions (
        admin_id BLOB PRIMARY KEY,
        flags TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS notifications (
        id BLOB PRIMARY KEY,
        recipient_id BLOB NOT NULL,
        kind TEXT NOT NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        related_resource_type TEXT,
        related_resource_id BLOB,
        is_read INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_notifications_recipient ON notifications(recipient_id, created_at DESC)",
];

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn opt_blob_to_uuid(blob: Option<Vec<u8>>) -> Option<Uuid> {
    blob.map(|b| blob_to_uuid(&b))
}

fn parse_enum<T>(raw: &str, parse: fn(&str) -> Option<T>, what: &str) -> anyhow::Result<T> {
    parse(raw).ok_or_else(|| anyhow::anyhow!("unknown {what} value in store: {raw}"))
}

impl SqliteStore {
    /// Opens (or creates) the database at `url` and bootstraps the schema.
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        // Each `:memory:` connection is its own database; cap the pool so
        // the schema and the data share one.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        tracing::debug!(url, "sqlite store ready");
        Ok(Self { pool })
    }

    fn row_to_profile(row: &SqliteRow) -> anyhow::Result<Profile> {
        Ok(Profile {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            nickname: row.get("nickname"),
            avatar_url: row.get("avatar_url"),
            identity_type: parse_enum(
                &row.get::<String, _>("identity_type"),
                IdentityType::parse,
                "identity_type",
            )?,
            role: parse_enum(&row.get::<String, _>("role"), Role::parse, "role")?,
            is_banned: row.get("is_banned"),
            created_at: row.get("created_at"),
        })
    }

    fn row_to_post(row: &SqliteRow) -> anyhow::Result<Post> {
        Ok(Post {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
            content: row.get("content"),
            media_urls: serde_json::from_str(&row.get::<String, _>("media_urls"))?,
            visibility: parse_enum(
                &row.get::<String, _>("visibility"),
                Visibility::parse,
                "visibility",
            )?,
            is_anonymous: row.get("is_anonymous"),
            view_count: row.get("view_count"),
            created_at: row.get("created_at"),
        })
    }

    fn row_to_comment(row: &SqliteRow) -> Comment {
        Comment {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            post_id: blob_to_uuid(row.get::<Vec<u8>, _>("post_id").as_slice()),
            author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
            content: row.get("content"),
            parent_id: opt_blob_to_uuid(row.get("parent_id")),
            reply_to_user_id: opt_blob_to_uuid(row.get("reply_to_user_id")),
            is_anonymous: row.get("is_anonymous"),
            created_at: row.get("created_at"),
        }
    }

    fn row_to_request(row: &SqliteRow) -> anyhow::Result<ModerationRequest> {
        Ok(ModerationRequest {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            requester_id: blob_to_uuid(row.get::<Vec<u8>, _>("requester_id").as_slice()),
            payload: serde_json::from_str(&row.get::<String, _>("payload"))?,
            status: parse_enum(
                &row.get::<String, _>("status"),
                RequestStatus::parse,
                "status",
            )?,
            handled_by: opt_blob_to_uuid(row.get("handled_by")),
            handled_at: row.get("handled_at"),
            admin_note: row.get("admin_note"),
            created_at: row.get("created_at"),
        })
    }

    fn row_to_notification(row: &SqliteRow) -> anyhow::Result<Notification> {
        Ok(Notification {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            recipient_id: blob_to_uuid(row.get::<Vec<u8>, _>("recipient_id").as_slice()),
            kind: parse_enum(&row.get::<String, _>("kind"), NotificationKind::parse, "kind")?,
            title: row.get("title"),
            content: row.get("content"),
            related_resource_type: row.get("related_resource_type"),
            related_resource_id: opt_blob_to_uuid(row.get("related_resource_id")),
            is_read: row.get("is_read"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl ProfileRepo for SqliteStore {
    async fn get_profile(&self, id: Uuid) -> anyhow::Result<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_profile).transpose()
    }

    async fn upsert_profile(&self, profile: Profile) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO profiles (id, nickname, avatar_url, identity_type, role, is_banned, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                nickname = excluded.nickname,
                avatar_url = excluded.avatar_url,
                identity_type = excluded.identity_type,
                role = excluded.role,
                is_banned = excluded.is_banned",
        )
        .bind(uuid_to_blob(profile.id))
        .bind(profile.nickname)
        .bind(profile.avatar_url)
        .bind(profile.identity_type.as_str())
        .bind(profile.role.as_str())
        .bind(profile.is_banned)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_identity_type(&self, id: Uuid, identity: IdentityType) -> anyhow::Result<()> {
        sqlx::query("UPDATE profiles SET identity_type = ? WHERE id = ?")
            .bind(identity.as_str())
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> anyhow::Result<()> {
        sqlx::query("UPDATE profiles SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_banned(&self, id: Uuid, banned: bool) -> anyhow::Result<()> {
        sqlx::query("UPDATE profiles SET is_banned = ? WHERE id = ?")
            .bind(banned)
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_profile_ids(&self, identity: Option<IdentityType>) -> anyhow::Result<Vec<Uuid>> {
        let rows = match identity {
            Some(identity) => {
                sqlx::query("SELECT id FROM profiles WHERE identity_type = ?")
                    .bind(identity.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => sqlx::query("SELECT id FROM profiles").fetch_all(&self.pool).await?,
        };
        Ok(rows
            .into_iter()
            .map(|row| blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()))
            .collect())
    }
}

#[async_trait]
impl PostRepo for SqliteStore {
    async fn insert_post(&self, post: Post) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO posts (id, author_id, content, media_urls, visibility, is_anonymous, view_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(post.id))
        .bind(uuid_to_blob(post.author_id))
        .bind(post.content)
        .bind(serde_json::to_string(&post.media_urls)?)
        .bind(post.visibility.as_str())
        .bind(post.is_anonymous)
        .bind(post.view_count)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_post).transpose()
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn increment_view_count(&self, id: Uuid) -> anyhow::Result<Option<i64>> {
        let row = sqlx::query(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = ? RETURNING view_count",
        )
        .bind(uuid_to_blob(id))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("view_count")))
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query("SELECT * FROM posts ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::row_to_post).collect()
    }
}

#[async_trait]
impl CommentRepo for SqliteStore {
    async fn insert_comment(&self, comment: Comment) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO comments (id, post_id, author_id, content, parent_id, reply_to_user_id, is_anonymous, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(comment.id))
        .bind(uuid_to_blob(comment.post_id))
        .bind(uuid_to_blob(comment.author_id))
        .bind(comment.content)
        .bind(comment.parent_id.map(uuid_to_blob))
        .bind(comment.reply_to_user_id.map(uuid_to_blob))
        .bind(comment.is_anonymous)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(Self::row_to_comment))
    }

    async fn list_comments(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query("SELECT * FROM comments WHERE post_id = ? ORDER BY created_at ASC")
            .bind(uuid_to_blob(post_id))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(Self::row_to_comment).collect())
    }

    async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn count_comments(&self, post_id: Uuid) -> anyhow::Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM comments WHERE post_id = ?")
            .bind(uuid_to_blob(post_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

#[async_trait]
impl LikeRepo for SqliteStore {
    async fn insert_if_absent(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        // The primary key makes a concurrent double-toggle lose cleanly.
        let result = sqlx::query(
            "INSERT OR IGNORE INTO likes (item_id, user_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(uuid_to_blob(item_id))
        .bind(uuid_to_blob(user_id))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_if_present(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE item_id = ? AND user_id = ?")
            .bind(uuid_to_blob(item_id))
            .bind(uuid_to_blob(user_id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn contains(&self, item_id: Uuid, user_id: Uuid) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT 1 FROM likes WHERE item_id = ? AND user_id = ?")
            .bind(uuid_to_blob(item_id))
            .bind(uuid_to_blob(user_id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn count_likes(&self, item_id: Uuid) -> anyhow::Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM likes WHERE item_id = ?")
            .bind(uuid_to_blob(item_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}

#[async_trait]
impl RequestRepo for SqliteStore {
    async fn insert_request(&self, request: ModerationRequest) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO moderation_requests (id, requester_id, payload, status, handled_by, handled_at, admin_note, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(request.id))
        .bind(uuid_to_blob(request.requester_id))
        .bind(serde_json::to_string(&request.payload)?)
        .bind(request.status.as_str())
        .bind(request.handled_by.map(uuid_to_blob))
        .bind(request.handled_at)
        .bind(request.admin_note)
        .bind(request.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> anyhow::Result<Option<ModerationRequest>> {
        let row = sqlx::query("SELECT * FROM moderation_requests WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_request).transpose()
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
        let payload_json = payload.map(|p| serde_json::to_string(&p)).transpose()?;
        let result = sqlx::query(
            "UPDATE moderation_requests
             SET status = ?, handled_by = ?, handled_at = ?, admin_note = ?,
                 payload = COALESCE(?, payload)
             WHERE id = ? AND status = 'pending'",
        )
        .bind(status.as_str())
        .bind(uuid_to_blob(handled_by))
        .bind(handled_at)
        .bind(admin_note)
        .bind(payload_json)
        .bind(uuid_to_blob(id))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn reopen_request(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            "UPDATE moderation_requests
             SET status = 'pending', handled_by = NULL, handled_at = NULL, admin_note = NULL
             WHERE id = ?",
        )
        .bind(uuid_to_blob(id))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_requests(
        &self,
        status: Option<RequestStatus>,
    ) -> anyhow::Result<Vec<ModerationRequest>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    "SELECT * FROM moderation_requests WHERE status = ? ORDER BY created_at DESC",
                )
                .bind(status.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM moderation_requests ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(Self::row_to_request).collect()
    }

    async fn list_requests_by_requester(
        &self,
        requester_id: Uuid,
    ) -> anyhow::Result<Vec<ModerationRequest>> {
        let rows = sqlx::query(
            "SELECT * FROM moderation_requests WHERE requester_id = ? ORDER BY created_at DESC",
        )
        .bind(uuid_to_blob(requester_id))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_request).collect()
    }
}

#[async_trait]
impl PermissionRepo for SqliteStore {
    async fn get_permissions(&self, admin_id: Uuid) -> anyhow::Result<Option<AdminPermissions>> {
        let row = sqlx::query("SELECT flags FROM admin_permissions WHERE admin_id = ?")
            .bind(uuid_to_blob(admin_id))
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Ok(serde_json::from_str(&r.get::<String, _>("flags"))?))
            .transpose()
    }

    async fn upsert_permissions(
        &self,
        admin_id: Uuid,
        permissions: AdminPermissions,
    ) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO admin_permissions (admin_id, flags) VALUES (?, ?)
             ON CONFLICT(admin_id) DO UPDATE SET flags = excluded.flags",
        )
        .bind(uuid_to_blob(admin_id))
        .bind(serde_json::to_string(&permissions)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove_permissions(&self, admin_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM admin_permissions WHERE admin_id = ?")
            .bind(uuid_to_blob(admin_id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationRepo for SqliteStore {
    async fn insert_notification(&self, notification: Notification) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO notifications (id, recipient_id, kind, title, content, related_resource_type, related_resource_id, is_read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(notification.id))
        .bind(uuid_to_blob(notification.recipient_id))
        .bind(notification.kind.as_str())
        .bind(notification.title)
        .bind(notification.content)
        .bind(notification.related_resource_type)
        .bind(notification.related_resource_id.map(uuid_to_blob))
        .bind(notification.is_read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Announcement fan-out path; one transaction so a partial batch never
    /// lands.
    async fn insert_notifications(&self, notifications: Vec<Notification>) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for notification in notifications {
            sqlx::query(
                "INSERT INTO notifications (id, recipient_id, kind, title, content, related_resource_type, related_resource_id, is_read, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(uuid_to_blob(notification.id))
            .bind(uuid_to_blob(notification.recipient_id))
            .bind(notification.kind.as_str())
            .bind(notification.title)
            .bind(notification.content)
            .bind(notification.related_resource_type)
            .bind(notification.related_resource_id.map(uuid_to_blob))
            .bind(notification.is_read)
            .bind(notification.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_unread(&self, recipient_id: Uuid) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE recipient_id = ? AND is_read = 0 ORDER BY created_at DESC",
        )
        .bind(uuid_to_blob(recipient_id))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_notification).collect()
    }

    async fn list_notifications(
        &self,
        recipient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT * FROM notifications WHERE recipient_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(uuid_to_blob(recipient_id))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_notification).collect()
    }

    async fn mark_read(&self, id: Uuid, recipient_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE id = ? AND recipient_id = ?",
        )
        .bind(uuid_to_blob(id))
        .bind(uuid_to_blob(recipient_id))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_all_read(&self, recipient_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0",
        )
        .bind(uuid_to_blob(recipient_id))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, id: Uuid, recipient_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND recipient_id = ?")
            .bind(uuid_to_blob(id))
            .bind(uuid_to_blob(recipient_id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
