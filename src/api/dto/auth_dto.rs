//! Sign-in request and response bodies.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AuthUser, SessionToken};

/// Request body for `POST /auth/sign-in`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignInRequest {
    /// Login e-mail address.
    pub email: String,
    /// Plain-text password.
    pub password: String,
}

/// Response body for `POST /auth/sign-in`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SignInResponse {
    /// Bearer token for subsequent requests.
    pub token: SessionToken,
    /// Signed-in user.
    pub user: AuthUser,
}
