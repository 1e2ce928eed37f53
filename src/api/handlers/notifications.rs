//! Notification handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use crate::api::dto::{NotificationListResponse, NotificationParams, UnreadResponse};
use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::error::{ErrorResponse, LeadSwipeError};

/// `GET /notifications`: Newest notifications with the unread total.
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "List notifications",
    security(("bearer" = [])),
    params(NotificationParams),
    responses(
        (status = 200, description = "Notifications", body = NotificationListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(params): Query<NotificationParams>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let user_id = caller.user.id;
    let data = state.notifications.list(user_id, params.limit).await?;
    let unread = state.notifications.unread_count(user_id).await?;
    Ok(Json(NotificationListResponse { data, unread }))
}

/// `GET /notifications/unread-count`
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    tag = "Notifications",
    summary = "Unread count",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Unread notifications", body = UnreadResponse),
    )
)]
pub async fn unread_count(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let count = state.notifications.unread_count(caller.user.id).await?;
    Ok(Json(UnreadResponse { count }))
}

/// `POST /notifications/{id}/read`
///
/// # Errors
///
/// Returns [`LeadSwipeError::NotificationNotFound`] if the caller has no
/// such notification.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    tag = "Notifications",
    summary = "Mark one notification read",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Marked read"),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    )
)]
pub async fn mark_read(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    state.notifications.mark_read(caller.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /notifications/read-all`
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    post,
    path = "/api/v1/notifications/read-all",
    tag = "Notifications",
    summary = "Mark every notification read",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Number of notifications marked", body = UnreadResponse),
    )
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let count = state.notifications.mark_all_read(caller.user.id).await?;
    Ok(Json(UnreadResponse { count }))
}

/// `DELETE /notifications/{id}`
///
/// # Errors
///
/// Returns [`LeadSwipeError::NotificationNotFound`] if the caller has no
/// such notification.
#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    tag = "Notifications",
    summary = "Delete a notification",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Notification id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Notification not found", body = ErrorResponse),
    )
)]
pub async fn delete_notification(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    state.notifications.delete(caller.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/{id}", delete(delete_notification))
}
