//! Bearer-token authentication extractor.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tokio::sync::Mutex;

use crate::app_state::AppState;
use crate::domain::{AuthUser, SessionToken};
use crate::error::LeadSwipeError;
use crate::session::LeadSession;

/// The authenticated caller, resolved from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Resolved user.
    pub user: AuthUser,
    /// Token the request carried.
    pub token: SessionToken,
}

impl CurrentUser {
    /// Resolves `token` through the auth provider.
    ///
    /// # Errors
    ///
    /// Returns [`LeadSwipeError::Unauthenticated`] for an unknown or expired
    /// token, or [`LeadSwipeError::Store`] if the provider fails.
    pub async fn resolve(state: &AppState, token: SessionToken) -> Result<Self, LeadSwipeError> {
        let user = state
            .store
            .auth
            .current_user(&token)
            .await?
            .ok_or(LeadSwipeError::Unauthenticated)?;
        Ok(Self { user, token })
    }

    /// The caller's swipe session, started on first use.
    ///
    /// # Errors
    ///
    /// Returns the session start error.
    pub async fn session(&self, state: &AppState) -> Result<Arc<Mutex<LeadSession>>, LeadSwipeError> {
        state.sessions.get_or_start(&self.user, &self.token).await
    }
}

/// Extracts the token from an `Authorization` header value.
fn bearer_token(value: &str) -> Option<SessionToken> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| SessionToken::new(token))
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = LeadSwipeError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(LeadSwipeError::Unauthenticated)?;
        Self::resolve(state, token).await
    }
}
