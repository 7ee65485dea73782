//! # Moderation Workflow
//!
//! Four request kinds behind one `decide()` surface. A request is mutated
//! exactly once, `pending -> approved` or `pending -> rejected`, via a
//! conditional store write so concurrent deciders cannot double-process.
//! Approval side effects (profile or permission mutation) form one causal
//! unit with the status write: if the dependent write fails, the status is
//! reverted before `Dependency` surfaces. Notifications come last and are
//! best-effort only.

use std::sync::Arc;

use chrono::{Days, Utc};
use cw_core::error::{AppError, Result};
use cw_core::models::{
    AdminPermissions, Decision, IdentityType, ModerationRequest, Profile, ReportTargetKind,
    RequestPayload, RequestStatus, Role, Viewer,
};
use cw_core::traits::{
    CommentRepo, PermissionRepo, PostRepo, ProfileRepo, RequestRepo,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::inbox::InboxService;
use crate::visibility;

/// Longest excerpt captured from reported content.
const REPORT_EXCERPT_LEN: usize = 100;

/// Journal access windows are bounded to a year.
const JOURNAL_DAYS_MAX: u32 = 365;

pub struct ModerationService {
    requests: Arc<dyn RequestRepo>,
    profiles: Arc<dyn ProfileRepo>,
    permissions: Arc<dyn PermissionRepo>,
    posts: Arc<dyn PostRepo>,
    comments: Arc<dyn CommentRepo>,
    inbox: Arc<InboxService>,
}

impl ModerationService {
    pub fn new(
        requests: Arc<dyn RequestRepo>,
        profiles: Arc<dyn ProfileRepo>,
        permissions: Arc<dyn PermissionRepo>,
        posts: Arc<dyn PostRepo>,
        comments: Arc<dyn CommentRepo>,
        inbox: Arc<InboxService>,
    ) -> Self {
        Self {
            requests,
            profiles,
            permissions,
            posts,
            comments,
            inbox,
        }
    }

    // ── Request submission ──────────────────────────────────────────────

    /// A guest asks to become alumni.
    pub async fn submit_identity_upgrade(
        &self,
        viewer: &Viewer,
        reason: &str,
    ) -> Result<ModerationRequest> {
        let actor_id = visibility::require_actor(viewer)?;
        if viewer.identity_type != IdentityType::Guest {
            return Err(AppError::unauthorized(
                "only guests may request an alumni upgrade",
            ));
        }
        let reason = non_empty(reason, "upgrade reason")?;
        self.insert(ModerationRequest::new(
            actor_id,
            RequestPayload::IdentityUpgrade { reason },
        ))
        .await
    }

    /// Any member reports a post or comment. The target's content is
    /// captured as an excerpt so the report outlives a deletion.
    pub async fn submit_content_report(
        &self,
        viewer: &Viewer,
        target_kind: ReportTargetKind,
        target_id: Uuid,
        reason: &str,
        suggestion: Option<String>,
    ) -> Result<ModerationRequest> {
        let actor_id = visibility::require_actor(viewer)?;
        let reason = non_empty(reason, "report reason")?;
        let target_excerpt = match target_kind {
            ReportTargetKind::Post => self
                .posts
                .get_post(target_id)
                .await?
                .map(|p| excerpt(&p.content))
                .ok_or_else(|| AppError::not_found("Post", target_id))?,
            ReportTargetKind::Comment => self
                .comments
                .get_comment(target_id)
                .await?
                .map(|c| excerpt(&c.content))
                .ok_or_else(|| AppError::not_found("Comment", target_id))?,
        };
        self.insert(ModerationRequest::new(
            actor_id,
            RequestPayload::ContentReport {
                target_kind,
                target_id,
                target_excerpt,
                reason,
                suggestion,
            },
        ))
        .await
    }

    /// Time-boxed journal archive access.
    pub async fn submit_journal_access(
        &self,
        viewer: &Viewer,
        requested_days: u32,
    ) -> Result<ModerationRequest> {
        let actor_id = visibility::require_actor(viewer)?;
        if requested_days == 0 || requested_days > JOURNAL_DAYS_MAX {
            return Err(AppError::Validation(format!(
                "requested days must be between 1 and {JOURNAL_DAYS_MAX}"
            )));
        }
        self.insert(ModerationRequest::new(
            actor_id,
            RequestPayload::JournalAccess {
                requested_days,
                access_start: None,
                access_end: None,
            },
        ))
        .await
    }

    /// An admin asks a superuser for different capability flags.
    pub async fn submit_permission_change(
        &self,
        viewer: &Viewer,
        requested: AdminPermissions,
        reason: &str,
    ) -> Result<ModerationRequest> {
        let actor_id = visibility::require_actor(viewer)?;
        if viewer.role != Role::Admin {
            return Err(AppError::unauthorized(
                "only admins may request a permission change",
            ));
        }
        let reason = non_empty(reason, "permission change reason")?;
        self.insert(ModerationRequest::new(
            actor_id,
            RequestPayload::PermissionChange { requested, reason },
        ))
        .await
    }

    async fn insert(&self, request: ModerationRequest) -> Result<ModerationRequest> {
        self.requests.insert_request(request.clone()).await?;
        Ok(request)
    }

    // ── Decision ────────────────────────────────────────────────────────

    /// Resolve a pending request. The capability precondition depends on the
    /// request kind; permission changes are reserved for superusers because
    /// they mint admin capability itself.
    pub async fn decide(
        &self,
        request_id: Uuid,
        actor_id: Uuid,
        decision: Decision,
        note: Option<String>,
    ) -> Result<()> {
        let request = self
            .requests
            .get_request(request_id)
            .await?
            .ok_or_else(|| AppError::not_found("ModerationRequest", request_id))?;
        let (actor, caps) = self.moderator(actor_id).await?;

        let allowed = match &request.payload {
            RequestPayload::ContentReport { .. } => caps.can_manage_content,
            RequestPayload::IdentityUpgrade { .. } => caps.can_manage_user_permissions,
            RequestPayload::JournalAccess { .. } => caps.can_manage_journal,
            RequestPayload::PermissionChange { .. } => actor.role == Role::Superuser,
        };
        if !allowed {
            return Err(AppError::unauthorized(
                "actor lacks the capability for this request kind",
            ));
        }
        if request.status != RequestStatus::Pending {
            return Err(AppError::InvalidStateTransition(format!(
                "request {request_id} is already {}",
                request.status.as_str()
            )));
        }

        // Journal windows land in the same conditional write as the status,
        // so an approved journal request is never missing its window.
        let payload_update = match (&request.payload, decision) {
            (RequestPayload::JournalAccess { requested_days, .. }, Decision::Approved) => {
                let start = Utc::now().date_naive();
                let end = start
                    .checked_add_days(Days::new(u64::from(*requested_days)))
                    .ok_or_else(|| {
                        AppError::Validation("requested window overflows the calendar".into())
                    })?;
                Some(RequestPayload::JournalAccess {
                    requested_days: *requested_days,
                    access_start: Some(start),
                    access_end: Some(end),
                })
            }
            _ => None,
        };

        let finalized = self
            .requests
            .finalize_if_pending(
                request_id,
                decision.as_status(),
                actor_id,
                Utc::now(),
                note,
                payload_update,
            )
            .await?;
        if !finalized {
            // Lost a concurrent decide(); the other actor's outcome stands.
            return Err(AppError::InvalidStateTransition(format!(
                "request {request_id} is no longer pending"
            )));
        }
        debug!(%request_id, outcome = ?decision, "moderation request finalized");

        if decision == Decision::Approved {
            if let Err(err) = self.apply_effect(&request).await {
                // Causal unit: never leave the request approved without its
                // effect. Revert, then surface the dependency failure.
                if let Err(reopen_err) = self.requests.reopen_request(request_id).await {
                    error!(%request_id, error = %reopen_err, "failed to reopen request after effect failure");
                }
                return Err(AppError::Dependency(format!("{err:#}")));
            }
        }

        self.notify_requester(&request, decision).await;
        Ok(())
    }

    /// The second write of an approval, per kind.
    async fn apply_effect(&self, request: &ModerationRequest) -> anyhow::Result<()> {
        match &request.payload {
            RequestPayload::IdentityUpgrade { .. } => {
                self.profiles
                    .set_identity_type(request.requester_id, IdentityType::Alumni)
                    .await
            }
            RequestPayload::PermissionChange { requested, .. } => {
                self.permissions
                    .upsert_permissions(request.requester_id, *requested)
                    .await
            }
            // Report approval is a verdict only; deletion is the explicit
            // `delete_reported_content` action. Journal windows were written
            // with the status.
            RequestPayload::ContentReport { .. } | RequestPayload::JournalAccess { .. } => Ok(()),
        }
    }

    /// Exactly one notification per transition, best-effort.
    async fn notify_requester(&self, request: &ModerationRequest, decision: Decision) {
        let result = match &request.payload {
            RequestPayload::ContentReport { target_kind, .. } => {
                self.inbox
                    .notify_report_feedback(
                        request.requester_id,
                        decision,
                        target_kind.as_str(),
                        request.id,
                    )
                    .await
            }
            payload => {
                self.inbox
                    .notify_audit_result(
                        request.requester_id,
                        decision,
                        payload.kind_label(),
                        request.id,
                    )
                    .await
            }
        };
        if let Err(err) = result {
            warn!(request_id = %request.id, error = %err, "decision notification failed");
        }
    }

    // ── Report-driven content removal ───────────────────────────────────

    /// Remove the content a report points at. A moderator may do this before
    /// or instead of approving the report; approving alone never deletes.
    pub async fn delete_reported_content(&self, report_id: Uuid, actor_id: Uuid) -> Result<()> {
        let request = self
            .requests
            .get_request(report_id)
            .await?
            .ok_or_else(|| AppError::not_found("ModerationRequest", report_id))?;
        let (target_kind, target_id) = match &request.payload {
            RequestPayload::ContentReport {
                target_kind,
                target_id,
                ..
            } => (*target_kind, *target_id),
            _ => {
                return Err(AppError::Validation(
                    "request is not a content report".into(),
                ))
            }
        };
        let (_, caps) = self.moderator(actor_id).await?;
        if !caps.can_manage_content {
            return Err(AppError::unauthorized("actor may not manage content"));
        }

        let deleted = match target_kind {
            ReportTargetKind::Post => self.posts.delete_post(target_id).await?,
            ReportTargetKind::Comment => self.comments.delete_comment(target_id).await?,
        };
        if !deleted {
            return Err(AppError::not_found(target_kind.as_str(), target_id));
        }
        Ok(())
    }

    // ── Direct privileged actions ───────────────────────────────────────

    pub async fn ban_user(&self, user_id: Uuid, actor_id: Uuid) -> Result<()> {
        self.set_ban(user_id, actor_id, true).await
    }

    pub async fn unban_user(&self, user_id: Uuid, actor_id: Uuid) -> Result<()> {
        self.set_ban(user_id, actor_id, false).await
    }

    async fn set_ban(&self, user_id: Uuid, actor_id: Uuid, banned: bool) -> Result<()> {
        let (_, caps) = self.moderator(actor_id).await?;
        if !caps.can_ban_users {
            return Err(AppError::unauthorized("actor may not ban users"));
        }
        if self.profiles.get_profile(user_id).await?.is_none() {
            return Err(AppError::not_found("Profile", user_id));
        }
        self.profiles.set_banned(user_id, banned).await?;
        Ok(())
    }

    /// Superuser appointment: classmates only, role plus an initial
    /// capability set.
    pub async fn appoint_admin(
        &self,
        user_id: Uuid,
        initial: AdminPermissions,
        actor_id: Uuid,
    ) -> Result<()> {
        self.require_superuser(actor_id).await?;
        let target = self
            .profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Profile", user_id))?;
        if target.identity_type != IdentityType::Classmate {
            return Err(AppError::Validation(
                "only classmates can be appointed admin".into(),
            ));
        }
        self.profiles.set_role(user_id, Role::Admin).await?;
        self.permissions.upsert_permissions(user_id, initial).await?;
        Ok(())
    }

    pub async fn remove_admin(&self, admin_id: Uuid, actor_id: Uuid) -> Result<()> {
        self.require_superuser(actor_id).await?;
        if self.profiles.get_profile(admin_id).await?.is_none() {
            return Err(AppError::not_found("Profile", admin_id));
        }
        self.profiles.set_role(admin_id, Role::User).await?;
        self.permissions.remove_permissions(admin_id).await?;
        Ok(())
    }

    /// Direct flag overwrite by a superuser, outside the request workflow.
    pub async fn set_admin_permissions(
        &self,
        admin_id: Uuid,
        permissions: AdminPermissions,
        actor_id: Uuid,
    ) -> Result<()> {
        self.require_superuser(actor_id).await?;
        let target = self
            .profiles
            .get_profile(admin_id)
            .await?
            .ok_or_else(|| AppError::not_found("Profile", admin_id))?;
        if target.role != Role::Admin {
            return Err(AppError::Validation("target is not an admin".into()));
        }
        self.permissions
            .upsert_permissions(admin_id, permissions)
            .await?;
        Ok(())
    }

    // ── Listings ────────────────────────────────────────────────────────

    /// Review queue; moderators only.
    pub async fn list_requests(
        &self,
        status: Option<RequestStatus>,
        actor_id: Uuid,
    ) -> Result<Vec<ModerationRequest>> {
        self.moderator(actor_id).await?;
        Ok(self.requests.list_requests(status).await?)
    }

    /// A requester's own history, also open to moderators.
    pub async fn list_requests_of(
        &self,
        requester_id: Uuid,
        actor_id: Uuid,
    ) -> Result<Vec<ModerationRequest>> {
        if requester_id != actor_id {
            self.moderator(actor_id).await?;
        }
        Ok(self.requests.list_requests_by_requester(requester_id).await?)
    }

    // ── Capability resolution ───────────────────────────────────────────

    /// Loads the actor and their effective capabilities. Superusers carry
    /// every flag without a stored record; plain users are refused.
    async fn moderator(&self, actor_id: Uuid) -> Result<(Profile, AdminPermissions)> {
        let actor = self
            .profiles
            .get_profile(actor_id)
            .await?
            .ok_or(AppError::unauthorized("unknown actor"))?;
        let caps = match actor.role {
            Role::Superuser => AdminPermissions::all(),
            Role::Admin => self
                .permissions
                .get_permissions(actor_id)
                .await?
                .unwrap_or_default(),
            Role::User => return Err(AppError::unauthorized("actor is not a moderator")),
        };
        Ok((actor, caps))
    }

    async fn require_superuser(&self, actor_id: Uuid) -> Result<Profile> {
        let (actor, _) = self.moderator(actor_id).await?;
        if actor.role != Role::Superuser {
            return Err(AppError::unauthorized("superuser required"));
        }
        Ok(actor)
    }
}

fn non_empty(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn excerpt(content: &str) -> String {
    content.chars().take(REPORT_EXCERPT_LEN).collect()
}
