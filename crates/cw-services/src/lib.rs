//! # cw-services
//!
//! The Classwall policy core: visibility evaluation, anonymity cloaking,
//! the engagement ledger, the comment thread model, the moderation workflow,
//! and the notification inbox. Consumed by an (external) API layer that
//! supplies a resolved [`cw_core::models::Viewer`] per request.

pub mod cloak;
pub mod comments;
pub mod engagement;
pub mod inbox;
pub mod moderation;
pub mod posts;
pub mod visibility;

#[cfg(test)]
mod testutil;
