//! Error types for team, invitation and message operations.

use thiserror::Error;

/// Result type alias for team operations
pub type TeamResult<T> = Result<T, TeamError>;

#[derive(Debug, Error)]
pub enum TeamError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("team not found: {id}")]
    TeamNotFound { id: String },

    #[error("invitation not found: {id}")]
    InvitationNotFound { id: String },

    #[error("user not found: {id}")]
    UserNotFound { id: String },

    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    /// A pending invitation already exists for this (team, user) pair.
    /// Expected business outcome, not a system fault.
    #[error("an invitation is already pending for this user")]
    AlreadyInvited,

    /// The invitation has already been responded to.
    #[error("invitation is no longer pending")]
    NotPending,
}

impl TeamError {
    pub fn team_not_found(id: impl Into<String>) -> Self {
        Self::TeamNotFound { id: id.into() }
    }

    pub fn invitation_not_found(id: impl Into<String>) -> Self {
        Self::InvitationNotFound { id: id.into() }
    }

    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::UserNotFound { id: id.into() }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    /// Soft outcomes are surfaced to callers as normal failure results,
    /// never as transport-level errors.
    pub fn is_soft_conflict(&self) -> bool {
        matches!(self, Self::AlreadyInvited | Self::NotPending)
    }
}
