//! # Domain Models
//!
//! These structs represent the core entities of Classwall: viewers, content
//! items, like memberships, moderation requests, and notifications.
//! Enum string forms are the snake_case values the stores persist.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Site-wide role of an account. `Superuser` implies every admin capability
/// without a stored permission record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    Superuser,
}

impl Role {
    pub fn is_moderator(self) -> bool {
        matches!(self, Role::Admin | Role::Superuser)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superuser => "superuser",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "superuser" => Some(Role::Superuser),
            _ => None,
        }
    }
}

/// Community identity tier, granted at registration or via an approved
/// identity-upgrade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityType {
    Guest,
    Alumni,
    Classmate,
}

impl IdentityType {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentityType::Guest => "guest",
            IdentityType::Alumni => "alumni",
            IdentityType::Classmate => "classmate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "guest" => Some(IdentityType::Guest),
            "alumni" => Some(IdentityType::Alumni),
            "classmate" => Some(IdentityType::Classmate),
            _ => None,
        }
    }
}

/// Post-level access tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    AlumniOnly,
    ClassmateOnly,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::AlumniOnly => "alumni_only",
            Visibility::ClassmateOnly => "classmate_only",
            Visibility::Private => "private",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "public" => Some(Visibility::Public),
            "alumni_only" => Some(Visibility::AlumniOnly),
            "classmate_only" => Some(Visibility::ClassmateOnly),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// The resolved identity+role context of one request. Rebuilt per request by
/// the (external) auth collaborator; never persisted by the core.
#[derive(Debug, Clone, Copy)]
pub struct Viewer {
    /// `None` for an unauthenticated visitor
    pub id: Option<Uuid>,
    pub role: Role,
    pub identity_type: IdentityType,
    pub is_banned: bool,
}

impl Viewer {
    /// An unauthenticated visitor: public content only.
    pub fn anonymous() -> Self {
        Viewer {
            id: None,
            role: Role::User,
            identity_type: IdentityType::Guest,
            is_banned: false,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }
}

/// Stored account record. The Anonymity Cloak reads this when shaping the
/// outbound author field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub identity_type: IdentityType,
    pub role: Role,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

/// A wall post. `view_count` starts at 0 and only ever increases; the
/// displayed like count is derived from like membership, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub media_urls: Vec<String>,
    pub visibility: Visibility,
    pub is_anonymous: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A comment on a post. Comments inherit the parent post's visibility.
///
/// `reply_to_user_id` is denormalized so the "replying to" label survives
/// deletion of the parent comment; children of a deleted parent keep their
/// `parent_id` and render a fallback label instead of erroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub reply_to_user_id: Option<Uuid>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

/// The author field as exposed to a particular viewer, after cloaking.
/// Outbound view types carry this instead of a raw `author_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedAuthor {
    pub id: Option<Uuid>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// True when the viewer is privileged enough to see through anonymity
    pub is_real_author_visible: bool,
}

/// Per-admin capability flags. Absent record + non-superuser role means
/// no capabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPermissions {
    pub can_manage_content: bool,
    pub can_manage_user_permissions: bool,
    pub can_manage_journal: bool,
    pub can_ban_users: bool,
    pub can_manage_album: bool,
}

impl AdminPermissions {
    pub fn all() -> Self {
        AdminPermissions {
            can_manage_content: true,
            can_manage_user_permissions: true,
            can_manage_journal: true,
            can_ban_users: true,
            can_manage_album: true,
        }
    }
}

/// Lifecycle of a moderation request. Terminal states are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

/// A moderator's verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_status(self) -> RequestStatus {
        match self {
            Decision::Approved => RequestStatus::Approved,
            Decision::Rejected => RequestStatus::Rejected,
        }
    }
}

/// What a content report points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportTargetKind {
    Post,
    Comment,
}

impl ReportTargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportTargetKind::Post => "post",
            ReportTargetKind::Comment => "comment",
        }
    }
}

/// Kind-specific payload of a moderation request. Each kind carries its own
/// shape; the workflow dispatches on the variant inside one `decide()` path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestPayload {
    /// Guest asking to become alumni
    IdentityUpgrade { reason: String },
    /// Report against a post or comment; the excerpt is captured at report
    /// time so the report stays reviewable after the content is deleted
    ContentReport {
        target_kind: ReportTargetKind,
        target_id: Uuid,
        target_excerpt: String,
        reason: String,
        suggestion: Option<String>,
    },
    /// Time-boxed access to the class journal archive; the window is filled
    /// in on approval
    JournalAccess {
        requested_days: u32,
        access_start: Option<NaiveDate>,
        access_end: Option<NaiveDate>,
    },
    /// Admin asking a superuser to change their capability flags
    PermissionChange {
        requested: AdminPermissions,
        reason: String,
    },
}

impl RequestPayload {
    /// Human label used in audit notifications.
    pub fn kind_label(&self) -> &'static str {
        match self {
            RequestPayload::IdentityUpgrade { .. } => "alumni upgrade",
            RequestPayload::ContentReport { .. } => "content report",
            RequestPayload::JournalAccess { .. } => "journal access",
            RequestPayload::PermissionChange { .. } => "permission change",
        }
    }
}

/// A privileged decision awaiting action. Mutated exactly once:
/// `pending -> approved` or `pending -> rejected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    #[serde(flatten)]
    pub payload: RequestPayload,
    pub status: RequestStatus,
    pub handled_by: Option<Uuid>,
    pub handled_at: Option<DateTime<Utc>>,
    pub admin_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ModerationRequest {
    pub fn new(requester_id: Uuid, payload: RequestPayload) -> Self {
        ModerationRequest {
            id: Uuid::new_v4(),
            requester_id,
            payload,
            status: RequestStatus::Pending,
            handled_by: None,
            handled_at: None,
            admin_note: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SystemAnnouncement,
    AuditResult,
    ReportFeedback,
    Interaction,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::SystemAnnouncement => "system_announcement",
            NotificationKind::AuditResult => "audit_result",
            NotificationKind::ReportFeedback => "report_feedback",
            NotificationKind::Interaction => "interaction",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system_announcement" => Some(NotificationKind::SystemAnnouncement),
            "audit_result" => Some(NotificationKind::AuditResult),
            "report_feedback" => Some(NotificationKind::ReportFeedback),
            "interaction" => Some(NotificationKind::Interaction),
            _ => None,
        }
    }
}

/// Inbox record. Write-once except `is_read`, which only goes false -> true.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub content: String,
    pub related_resource_type: Option<String>,
    pub related_resource_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Notification {
            id: Uuid::new_v4(),
            recipient_id,
            kind,
            title: title.into(),
            content: content.into(),
            related_resource_type: None,
            related_resource_id: None,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    pub fn about(mut self, resource_type: &str, resource_id: Uuid) -> Self {
        self.related_resource_type = Some(resource_type.to_string());
        self.related_resource_id = Some(resource_id);
        self
    }
}
