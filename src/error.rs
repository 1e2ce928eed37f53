//! Service error types with HTTP status code mapping.
//!
//! [`LeadSwipeError`] is the central error type. Each variant maps to a
//! specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{LeadId, MembershipKind};
use crate::store::StoreError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "lead not found: 42",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A step of a multi-step membership operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceStep {
    /// Membership kind touched by the step.
    pub kind: MembershipKind,
    /// `true` for an insert, `false` for a delete.
    pub insert: bool,
}

impl std::fmt::Display for SequenceStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = if self.insert { "add" } else { "remove" };
        write!(f, "{verb} {}", self.kind)
    }
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Auth/Validation | 401 / 400                    |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server/Store    | 500 / 403                    |
/// | 4000–4999 | Limits          | 422 Unprocessable Entity     |
#[derive(Debug, thiserror::Error)]
pub enum LeadSwipeError {
    /// No valid auth session.
    #[error("not authenticated")]
    Unauthenticated,

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Lead with the given id does not exist.
    #[error("lead not found: {0}")]
    LeadNotFound(LeadId),

    /// Notification with the given id does not exist for the user.
    #[error("notification not found: {0}")]
    NotificationNotFound(i64),

    /// Group with the given row id does not exist for the user.
    #[error("group not found: {0}")]
    GroupNotFound(i64),

    /// The user already linked the maximum number of groups.
    #[error("group limit reached: at most {limit} groups per user")]
    GroupLimitReached {
        /// The per-user limit.
        limit: usize,
    },

    /// Store or auth provider failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A compound operation stopped after some steps were durably applied.
    #[error("lead {lead_id}: completed [{}] but failed to {failed}: {source}", join_steps(.completed))]
    PartialSequence {
        /// Lead the sequence targeted.
        lead_id: LeadId,
        /// Steps that were applied and remain applied.
        completed: Vec<SequenceStep>,
        /// Step that failed.
        failed: SequenceStep,
        /// Underlying failure.
        source: StoreError,
    },
}

fn join_steps(steps: &[SequenceStep]) -> String {
    steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl LeadSwipeError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::Unauthenticated => 1000,
            Self::InvalidRequest(_) => 1001,
            Self::LeadNotFound(_) => 2001,
            Self::NotificationNotFound(_) => 2002,
            Self::GroupNotFound(_) => 2003,
            Self::Store(StoreError::NotFound(_)) => 2004,
            Self::Store(StoreError::Conflict(_)) => 2009,
            Self::Store(StoreError::Query(_)) => 3001,
            Self::Store(StoreError::Connection(_)) => 3002,
            Self::Store(StoreError::PermissionDenied(_)) => 3003,
            Self::PartialSequence { .. } => 3010,
            Self::GroupLimitReached { .. } => 4001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::LeadNotFound(_)
            | Self::NotificationNotFound(_)
            | Self::GroupNotFound(_)
            | Self::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            Self::GroupLimitReached { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(StoreError::Query(_) | StoreError::Connection(_))
            | Self::PartialSequence { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::PartialSequence { completed, .. } => Some(format!(
                "already applied and not rolled back: {}",
                join_steps(completed)
            )),
            _ => None,
        }
    }
}

impl IntoResponse for LeadSwipeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: self.details(),
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
