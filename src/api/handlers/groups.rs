//! Linked Facebook group handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use axum::{Json, Router};

use crate::api::extract::CurrentUser;
use crate::app_state::AppState;
use crate::domain::{FacebookGroup, NewGroup};
use crate::error::{ErrorResponse, LeadSwipeError};

/// Reloads the `groups` tab of the caller's running session, if any.
async fn refresh_session_groups(state: &AppState, caller: &CurrentUser) {
    let Some(session) = state.sessions.get(&caller.token).await else {
        return;
    };
    let mut session = session.lock().await;
    if let Err(err) = session.reload_groups().await {
        tracing::warn!(user_id = %caller.user.id, error = %err, "group tab reload failed");
    }
}

/// `GET /groups`
///
/// # Errors
///
/// Returns [`LeadSwipeError::Store`] on store failure.
#[utoipa::path(
    get,
    path = "/api/v1/groups",
    tag = "Groups",
    summary = "List linked groups",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Groups, oldest first", body = Vec<FacebookGroup>),
    )
)]
pub async fn list_groups(
    State(state): State<AppState>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, LeadSwipeError> {
    Ok(Json(state.groups.list(caller.user.id).await?))
}

/// `POST /groups`: Link a group.
///
/// # Errors
///
/// Returns [`LeadSwipeError::InvalidRequest`] for a bad URL or blank name,
/// [`LeadSwipeError::GroupLimitReached`] past the limit, and a conflict for
/// a duplicate.
#[utoipa::path(
    post,
    path = "/api/v1/groups",
    tag = "Groups",
    summary = "Link a group",
    description = "A blank `group_id` is taken from `group_url`. At most 10 groups per user.",
    security(("bearer" = [])),
    request_body = NewGroup,
    responses(
        (status = 201, description = "Group linked", body = FacebookGroup),
        (status = 400, description = "Invalid group", body = ErrorResponse),
        (status = 409, description = "Group already linked", body = ErrorResponse),
        (status = 422, description = "Group limit reached", body = ErrorResponse),
    )
)]
pub async fn add_group(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(group): Json<NewGroup>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    let stored = state.groups.add(caller.user.id, group).await?;
    refresh_session_groups(&state, &caller).await;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// `DELETE /groups/{id}`: Unlink a group.
///
/// # Errors
///
/// Returns [`LeadSwipeError::GroupNotFound`] if the caller has no such
/// group.
#[utoipa::path(
    delete,
    path = "/api/v1/groups/{id}",
    tag = "Groups",
    summary = "Unlink a group",
    security(("bearer" = [])),
    params(("id" = i64, Path, description = "Group row id")),
    responses(
        (status = 204, description = "Group unlinked"),
        (status = 404, description = "Group not found", body = ErrorResponse),
    )
)]
pub async fn remove_group(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, LeadSwipeError> {
    state.groups.remove(caller.user.id, id).await?;
    refresh_session_groups(&state, &caller).await;
    Ok(StatusCode::NO_CONTENT)
}

/// Group routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/groups", get(list_groups).post(add_group))
        .route("/groups/{id}", delete(remove_group))
}
