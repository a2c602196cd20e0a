//! Unified error handling for parlord.
//!
//! One taxonomy covers every engine operation. Each variant is a
//! permanent rejection of the specific request, never a transient
//! fault; infrastructure failures ride in through `Db` and are kept
//! apart from the domain so no storage detail leaks to clients.

use crate::db::DbError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Errors produced by engine operations.
#[derive(Debug, Error)]
pub enum OpError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("permission denied")]
    PermissionDenied,

    #[error("channel name is already taken: {0}")]
    NameTaken(String),

    #[error("user is already a member of the channel")]
    AlreadyMember,

    #[error("you have already kicked this user")]
    AlreadyKicked,

    #[error("user was already invited")]
    AlreadyInvited,

    #[error("you can not invite yourself")]
    SelfInvite,

    #[error("you can not kick or revoke yourself")]
    SelfModeration,

    #[error("you are not in the channel")]
    NotMember,

    #[error("user is not a channel member")]
    TargetNotMember,

    #[error("invitation does not belong to you")]
    NotInvitee,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Result type for engine operations.
pub type OpResult<T> = Result<T, OpError>;

impl OpError {
    /// Stable snake_case label for logs and wire error payloads.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::NameTaken(_) => "name_taken",
            Self::AlreadyMember => "already_member",
            Self::AlreadyKicked => "already_kicked",
            Self::AlreadyInvited => "already_invited",
            Self::SelfInvite => "self_invite",
            Self::SelfModeration => "self_moderation",
            Self::NotMember => "not_member",
            Self::TargetNotMember => "target_not_member",
            Self::NotInvitee => "not_invitee",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InvalidState(_) => "invalid_state",
            Self::Db(_) => "internal_error",
        }
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PermissionDenied | Self::NotInvitee => StatusCode::FORBIDDEN,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::NameTaken(_)
            | Self::AlreadyMember
            | Self::AlreadyKicked
            | Self::AlreadyInvited => StatusCode::CONFLICT,
            Self::SelfInvite
            | Self::SelfModeration
            | Self::NotMember
            | Self::TargetNotMember
            | Self::InvalidState(_) => StatusCode::BAD_REQUEST,
            Self::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for OpError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Domain errors carry their message; storage failures do not.
        let message = if let Self::Db(ref err) = self {
            tracing::error!(error = %err, "database error while handling request");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            status: status.as_u16(),
            code: self.error_code(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
