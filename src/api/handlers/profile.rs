//! Profile handlers.

use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::UpdateProfileRequest;
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::domain::{MAX_AVATAR_URL_LEN, UserProfile};
use crate::error::{ErrorResponse, LeadSwipeError};

/// `GET /profile`
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    tag = "Profile",
    summary = "Caller's profile",
    description = "Returns the caller's profile, creating a blank one on first read.",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    Ok(Json(state.profiles.get(&caller.user).await?))
}

/// `PUT /profile`: Update the display name or avatar.
///
/// # Errors
///
/// Returns [`LeadSwipeError::InvalidRequest`] for a bad avatar and
/// [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    tag = "Profile",
    summary = "Update profile",
    security(("bearer" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserProfile),
        (status = 400, description = "Invalid avatar", body = ErrorResponse),
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    Ok(Json(state.profiles.update(&caller.user, req.into()).await?))
}

/// Profile routes. Bodies may carry an inline avatar, so the limit is raised.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .layer(DefaultBodyLimit::max(MAX_AVATAR_URL_LEN + 64 * 1024))
}
