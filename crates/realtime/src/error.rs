//! Error types for the realtime hub.

use huddle_teams::TeamError;
use thiserror::Error;

use crate::registry::RegistryError;

pub type RealtimeResult<T> = Result<T, RealtimeError>;

#[derive(Debug, Error)]
pub enum RealtimeError {
    /// Benign disconnect race; callers treat it as a no-op.
    #[error("session not found")]
    SessionNotFound,

    /// The membership re-check failed at request time. Unlike `Forbidden`
    /// this reflects a currently true authorization fact, not a malformed
    /// request.
    #[error("denied: {reason}")]
    Denied { reason: String },

    #[error(transparent)]
    Team(#[from] TeamError),
}

impl RealtimeError {
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }
}

impl From<RegistryError> for RealtimeError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::SessionNotFound => Self::SessionNotFound,
        }
    }
}
