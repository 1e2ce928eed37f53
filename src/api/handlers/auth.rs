//! Sign-in and sign-out.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{SignInRequest, SignInResponse};
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, LeadSwipeError};

/// `POST /auth/sign-in`: Exchange credentials for a bearer token.
///
/// # Errors
///
/// Returns [`LeadSwipeError::Unauthenticated`] on bad credentials.
#[utoipa::path(
    post,
    path = "/auth/sign-in",
    tag = "Auth",
    summary = "Sign in",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 401, description = "Bad credentials", body = ErrorResponse),
    )
)]
pub async fn sign_in(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let (user, token) = state
        .store
        .auth
        .sign_in(req.email.trim(), &req.password)
        .await?
        .ok_or(LeadSwipeError::Unauthenticated)?;
    tracing::info!(user_id = %user.id, "signed in");
    Ok(Json(SignInResponse { token, user }))
}

/// `POST /auth/sign-out`: End the auth session and drop its swipe session.
///
/// # Errors
///
/// Returns [`LeadSwipeError::Unauthenticated`] without a valid token.
#[utoipa::path(
    post,
    path = "/auth/sign-out",
    tag = "Auth",
    summary = "Sign out",
    security(("bearer" = [])),
    responses(
        (status = 204, description = "Signed out"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn sign_out(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    state.store.auth.sign_out(&caller.token).await?;
    state.sessions.remove(&caller.token).await;
    tracing::info!(user_id = %caller.user.id, "signed out");
    Ok(StatusCode::NO_CONTENT)
}

/// Auth routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
}
