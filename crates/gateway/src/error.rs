//! Error types for the gateway layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A membership re-check failed at request time. Kept apart from
    /// `Forbidden`: the request was well-formed, the authorization fact
    /// is simply no longer true.
    #[error("denied: {0}")]
    Denied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal server error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden(_) | GatewayError::Denied(_) => StatusCode::FORBIDDEN,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Conflict(_) => StatusCode::CONFLICT,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            GatewayError::AuthenticationFailed(_) => "authentication_failed",
            GatewayError::Forbidden(_) => "forbidden",
            GatewayError::Denied(_) => "denied",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::Conflict(_) => "conflict",
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl From<huddle_auth::AuthError> for GatewayError {
    fn from(error: huddle_auth::AuthError) -> Self {
        use huddle_auth::AuthError;
        match error {
            AuthError::InvalidCredential | AuthError::UnknownUser => {
                GatewayError::AuthenticationFailed(error.to_string())
            }
            AuthError::UserExists => GatewayError::Conflict(error.to_string()),
            AuthError::Database(err) => GatewayError::Internal(err.to_string()),
            AuthError::PasswordHash(err) => GatewayError::Internal(err.to_string()),
        }
    }
}

impl From<huddle_teams::TeamError> for GatewayError {
    fn from(error: huddle_teams::TeamError) -> Self {
        use huddle_teams::TeamError;
        match error {
            TeamError::TeamNotFound { .. }
            | TeamError::InvitationNotFound { .. }
            | TeamError::UserNotFound { .. } => GatewayError::NotFound(error.to_string()),
            TeamError::Forbidden { reason } => GatewayError::Forbidden(reason),
            // Soft conflicts are normally answered with a success-shaped
            // payload before conversion; this is the fallback.
            TeamError::AlreadyInvited | TeamError::NotPending => {
                GatewayError::Conflict(error.to_string())
            }
            TeamError::Database(err) => GatewayError::Internal(err.to_string()),
        }
    }
}

impl From<huddle_realtime::RealtimeError> for GatewayError {
    fn from(error: huddle_realtime::RealtimeError) -> Self {
        use huddle_realtime::RealtimeError;
        match error {
            RealtimeError::SessionNotFound => GatewayError::NotFound(error.to_string()),
            RealtimeError::Denied { reason } => GatewayError::Denied(reason),
            RealtimeError::Team(err) => err.into(),
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(error: sqlx::Error) -> Self {
        GatewayError::Internal(error.to_string())
    }
}
