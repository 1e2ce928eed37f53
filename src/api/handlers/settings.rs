//! User settings handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::UpdateSettingsRequest;
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::domain::UserSettings;
use crate::error::{ErrorResponse, LeadSwipeError};

/// `GET /settings`
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    tag = "Settings",
    summary = "Stored settings",
    description = "Returns the caller's settings, creating defaults on first read.",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Settings", body = UserSettings),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn get_settings(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    Ok(Json(state.settings.get(caller.user.id).await?))
}

/// `PUT /settings`: Update the fields present in the body.
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    put,
    path = "/api/v1/settings",
    tag = "Settings",
    summary = "Update settings",
    security(("bearer" = [])),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = UserSettings),
    )
)]
pub async fn update_settings(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let user_id = caller.user.id;
    let mut settings = state.settings.get(user_id).await?;
    if let Some(keywords) = req.keywords {
        settings = state.settings.update_keywords(user_id, keywords).await?;
    }
    if let Some(theme) = req.theme {
        settings = state.settings.update_theme(user_id, theme).await?;
    }
    if req.notification_email.is_some() || req.notification_push.is_some() {
        let email = req.notification_email.unwrap_or(settings.notification_email);
        let push = req.notification_push.unwrap_or(settings.notification_push);
        settings = state.settings.update_notifications(user_id, email, push).await?;
    }

    if let Some(session) = state.sessions.get(&caller.token).await {
        let mut session = session.lock().await;
        if let Err(err) = session.sync_settings().await {
            tracing::warn!(%user_id, error = %err, "session settings sync failed");
        }
    }
    Ok(Json(settings))
}

/// Settings routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}
