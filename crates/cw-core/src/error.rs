//! # AppError
//!
//! Centralized error handling for the Classwall ecosystem.
//! Maps domain-specific failures to actionable error types.
//!
//! The `Display` text of `Unauthenticated` and `Unauthorized` is deliberately
//! a flat "no access": probing viewers must not learn *which* visibility rule
//! denied them. The machine-readable reason stays in the variant for logs.

use thiserror::Error;

/// The primary error type for all cw-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// No viewer identity where one is required (e.g., liking while logged out)
    #[error("no access")]
    Unauthenticated,

    /// Viewer identity present but policy denies the action
    #[error("no access")]
    Unauthorized { reason: &'static str },

    /// Resource not found (e.g., Post, Comment, Moderation Request)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Malformed input (e.g., empty content, bad media URL, too many media items)
    #[error("validation error: {0}")]
    Validation(String),

    /// Moderation request no longer in `pending`
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Infrastructure failure (store or notification collaborator), retryable
    #[error("temporary service error, please retry")]
    Dependency(String),
}

impl AppError {
    pub fn unauthorized(reason: &'static str) -> Self {
        AppError::Unauthorized { reason }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        AppError::NotFound(entity.to_string(), id.to_string())
    }
}

/// Collaborator errors cross the port boundary as `anyhow::Error`;
/// the service layer surfaces them uniformly as `Dependency`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Dependency(format!("{err:#}"))
    }
}

/// A specialized Result type for Classwall logic.
pub type Result<T> = std::result::Result<T, AppError>;
